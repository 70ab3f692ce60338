//! Display pipeline states and errors

use tickertube_hal::fetch::FetchError;

/// Pipeline states
///
/// One fetch-and-show cycle walks
/// `BeginHttpRequest -> AwaitingTransportReady -> AwaitingResponse ->`
/// `BeginDisplaySequence -> DecodeDisplayValue -> EncodeShiftRegister ->`
/// `WriteShiftRegister -> Idle`. A direct [`display`] call enters at
/// `BeginDisplaySequence`.
///
/// [`display`]: super::DisplayPipeline::display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayState {
    /// Ready for a new cycle
    #[default]
    Idle,
    /// Last step failed; falls back to Idle on the next poll
    Error,
    /// Fetch requested
    BeginHttpRequest,
    /// Waiting for the fetch transport to become free
    AwaitingTransportReady,
    /// Request in flight, draining response events
    AwaitingResponse,
    /// Value ready to be shown
    BeginDisplaySequence,
    /// Mapping symbols to cathodes
    DecodeDisplayValue,
    /// Building the register image
    EncodeShiftRegister,
    /// Waiting for the shift-register transport
    WriteShiftRegister,
}

impl DisplayState {
    /// Check if a new cycle may start
    pub fn is_idle(&self) -> bool {
        matches!(self, DisplayState::Idle)
    }
}

/// Errors returned to callers of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// A cycle is already running
    Busy,
}

/// Cause of the most recent transition to [`DisplayState::Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineFault {
    /// The transport refused the request
    SubmitFailed(FetchError),
    /// The request failed while the response was streaming
    TransferFailed(FetchError),
}
