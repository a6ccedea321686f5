//! # Shared Vocabulary (engine ↔ device backend)
//!
//! Defines the types and constants shared between the host-side tracing
//! engine and implementations of the device tracing backend. Records that may
//! cross an FFI or process boundary use `#[repr(C)]` with fixed-size name
//! fields for a stable memory layout.
//!
//! ## Key Types
//!
//! - [`ScopeKind`] - What kind of execution scope an event was captured in
//! - [`ActivityKind`] - What a caller asks a session to record
//! - [`BackendActivity`] - The device backend's own activity vocabulary
//! - [`DeviceActivityRecord`] - One device-side activity as the backend
//!   reports it at trace retrieval

#![no_std]

// ============================================================================
// Constants
// ============================================================================

/// Device index of the host CPU.
///
/// CPU-side events always carry this index; device-side activities carry the
/// backend's own (nonzero) device indices.
pub const DEVICE_HOST_CPU: u32 = 0;

/// Name of the synthetic marker event emitted when a session starts.
pub const MARK_SESSION_START: &str = "__start_session";

/// Name of the synthetic marker event emitted when a session stops.
pub const MARK_SESSION_STOP: &str = "__stop_session";

/// Sequence number recorded when no sequence tracking applies.
pub const SEQUENCE_NONE: i64 = -1;

/// Maximum length of a device activity name, in bytes.
///
/// [`DeviceActivityRecord`] stores names in a fixed array of this size so the
/// record stays plain-old-data; longer names are truncated by the backend.
pub const ACTIVITY_NAME_LEN: usize = 64;

// ============================================================================
// Scope and activity vocabulary
// ============================================================================

/// Kind of execution scope an instrumented invocation ran in.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScopeKind {
    /// An ordinary function invocation.
    Function = 0,
    /// A backward/gradient node. Its informative call-stack belongs to the
    /// corresponding forward invocation, so stacks are never captured here.
    BackwardFunction = 1,
    /// An explicit user-delimited region.
    UserScope = 2,
}

impl ScopeKind {
    /// Decode a scope kind from its wire tag.
    #[must_use]
    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Function),
            1 => Some(Self::BackwardFunction),
            2 => Some(Self::UserScope),
            _ => None,
        }
    }
}

/// What a caller asks a tracing session to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActivityKind {
    /// Host-side instrumented scopes.
    Cpu,
    /// Device/accelerator-side activity reported by the backend.
    Device,
}

/// Activity classes understood by the device tracing backend.
///
/// Requested [`ActivityKind`]s are mapped onto these before the backend's
/// trace is prepared; the mapping lives engine-side.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BackendActivity {
    /// Correlation markers pushed by the host around instrumented scopes.
    ExternalCorrelation = 0,
    /// Device runtime API calls.
    DeviceRuntime = 1,
    /// Host↔device and device↔device memory copies.
    MemoryTransfer = 2,
    /// Device memory fill operations.
    MemoryFill = 3,
    /// Concurrent device kernel execution.
    ConcurrentKernel = 4,
}

impl BackendActivity {
    /// Decode a backend activity from its wire tag.
    #[must_use]
    pub fn from_u32(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::ExternalCorrelation),
            1 => Some(Self::DeviceRuntime),
            2 => Some(Self::MemoryTransfer),
            3 => Some(Self::MemoryFill),
            4 => Some(Self::ConcurrentKernel),
            _ => None,
        }
    }
}

// ============================================================================
// Device activity record
// ============================================================================

/// One device-side activity as reported by the tracing backend.
///
/// The backend hands an ordered collection of these back at trace retrieval;
/// the engine treats the collection as opaque apart from correlation-id
/// matching. `#[repr(C)]` keeps the layout stable across whatever boundary a
/// backend implementation lives behind.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DeviceActivityRecord {
    /// Activity name, NUL-padded (see [`ACTIVITY_NAME_LEN`]).
    pub name: [u8; ACTIVITY_NAME_LEN],

    /// Correlation id linking this activity to a host-side scope, or 0 when
    /// the backend could not attribute it.
    pub correlation_id: u64,

    /// Start time in microseconds on the backend's clock.
    pub start_us: u64,

    /// Duration in microseconds.
    pub duration_us: u64,

    /// Device the activity ran on (never [`DEVICE_HOST_CPU`]).
    pub device_index: u32,

    /// Activity class tag (see [`BackendActivity::from_u32`]).
    pub kind: u32,
}

impl DeviceActivityRecord {
    /// Build a record, truncating `name` to [`ACTIVITY_NAME_LEN`] bytes.
    #[must_use]
    pub fn new(
        name: &str,
        correlation_id: u64,
        start_us: u64,
        duration_us: u64,
        device_index: u32,
        kind: BackendActivity,
    ) -> Self {
        let mut buf = [0u8; ACTIVITY_NAME_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(ACTIVITY_NAME_LEN);
        buf[..len].copy_from_slice(&bytes[..len]);
        Self {
            name: buf,
            correlation_id,
            start_us,
            duration_us,
            device_index,
            kind: kind as u32,
        }
    }

    /// The activity name as a string slice, up to the first NUL byte.
    ///
    /// Returns an empty string when the name bytes are not valid UTF-8 (a
    /// truncation can split a multi-byte character).
    #[must_use]
    pub fn name(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(ACTIVITY_NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }

    /// Decoded activity class, if the tag is known.
    #[must_use]
    pub fn activity(&self) -> Option<BackendActivity> {
        BackendActivity::from_u32(self.kind)
    }
}

impl core::fmt::Debug for DeviceActivityRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceActivityRecord")
            .field("name", &self.name())
            .field("correlation_id", &self.correlation_id)
            .field("start_us", &self.start_us)
            .field("duration_us", &self.duration_us)
            .field("device_index", &self.device_index)
            .field("kind", &self.kind)
            .finish()
    }
}
