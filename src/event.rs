//! Event types for runtimes.

/// An event emitted by a module, tagged for host-side indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Name of the module that emitted the event.
    pub module: &'static str,
    /// Code uniquely identifying the event within the module.
    pub code: u32,
    /// CBOR-serialized event body.
    pub value: Vec<u8>,
}

/// An event emitted by a module.
pub trait Event: Sized + cbor::Encode {
    /// Name of the module that emitted the event.
    fn module_name() -> &'static str;

    /// Code uniquely identifying the event within the module.
    fn code(&self) -> u32;

    /// Converts an event into the raw tagged form passed to the host.
    fn into_raw(self) -> RawEvent {
        let code = self.code();
        RawEvent {
            module: Self::module_name(),
            code,
            value: cbor::to_vec(self),
        }
    }
}
