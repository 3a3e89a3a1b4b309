/// How a consumer takes ownership of a remote file before fetching it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimMode {
    /// Fetch the oldest file directly. Two consumers polling the same directory may both
    /// receive the same message.
    #[default]
    None,
    /// Rename the oldest file to a hidden claim name first. Only the consumer whose rename
    /// succeeds fetches it, the others move on to the next file.
    Rename,
}
