//! Fetch-and-show state machine
//!
//! [`DisplayPipeline::poll`] advances at most one state per call, apart
//! from draining every queued response event while a request is in flight.
//! Waiting on a busy transport is just staying in the same state until the
//! next poll.

use heapless::String;
use tickertube_hal::fetch::{FetchError, FetchEvent, FetchTransport};
use tickertube_hal::shift_register::ShiftRegisterTransport;

use super::encode;
use super::scan;
use super::state::{DisplayError, DisplayState, PipelineFault};
use crate::config::types::{DisplayConfig, MAX_TOKEN_LEN, MAX_URL_LEN};
use crate::config::wiring::{WiringError, WiringTable, MAX_SHIFT_REGISTERS, MAX_TUBES};

/// Display pipeline
pub struct DisplayPipeline<F, S> {
    fetch: F,
    shift: S,
    wiring: WiringTable,
    request_url: String<MAX_URL_LEN>,
    match_token: String<MAX_TOKEN_LEN>,
    state: DisplayState,
    /// A value was taken from the current response
    value_parsed: bool,
    /// ASCII symbols, leftmost tube first; 0 is an empty slot
    display_value: [u8; MAX_TUBES],
    cathode_index: [Option<u8>; MAX_TUBES],
    register_shift_state: [u8; MAX_SHIFT_REGISTERS],
    last_fault: Option<PipelineFault>,
}

impl<F: FetchTransport, S: ShiftRegisterTransport> DisplayPipeline<F, S> {
    /// Create a pipeline over a validated wiring table
    pub fn new(
        wiring: WiringTable,
        request_url: String<MAX_URL_LEN>,
        match_token: String<MAX_TOKEN_LEN>,
        fetch: F,
        shift: S,
    ) -> Self {
        Self {
            fetch,
            shift,
            wiring,
            request_url,
            match_token,
            state: DisplayState::Idle,
            value_parsed: false,
            display_value: [0; MAX_TUBES],
            cathode_index: [None; MAX_TUBES],
            register_shift_state: [0; MAX_SHIFT_REGISTERS],
            last_fault: None,
        }
    }

    /// Create a pipeline from configuration
    pub fn from_config(config: &DisplayConfig, fetch: F, shift: S) -> Result<Self, WiringError> {
        Ok(Self::new(
            config.wiring()?,
            config.request_url.clone(),
            config.match_token.clone(),
            fetch,
            shift,
        ))
    }

    /// Current state
    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// True while a cycle is running
    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }

    /// Cause of the last failure, kept until the next cycle starts
    pub fn last_fault(&self) -> Option<PipelineFault> {
        self.last_fault
    }

    /// True once the current response produced a value
    pub fn value_parsed(&self) -> bool {
        self.value_parsed
    }

    /// Symbols of the current value, one per tube
    pub fn display_value(&self) -> &[u8] {
        &self.display_value[..self.wiring.tube_count()]
    }

    /// Register image sent by the last write, first register first
    pub fn register_state(&self) -> &[u8] {
        &self.register_shift_state[..self.wiring.shift_registers()]
    }

    /// Wiring the pipeline encodes with
    pub fn wiring(&self) -> &WiringTable {
        &self.wiring
    }

    /// Resource fetched by each cycle
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// Get access to the fetch transport
    pub fn fetch(&self) -> &F {
        &self.fetch
    }

    /// Get mutable access to the fetch transport
    pub fn fetch_mut(&mut self) -> &mut F {
        &mut self.fetch
    }

    /// Get access to the shift-register transport
    pub fn shift(&self) -> &S {
        &self.shift
    }

    /// Get mutable access to the shift-register transport
    pub fn shift_mut(&mut self) -> &mut S {
        &mut self.shift
    }

    /// Show `value` without fetching
    ///
    /// Takes up to one byte per tube, stopping at a NUL; missing positions
    /// are left empty.
    pub fn display(&mut self, value: &[u8]) -> Result<(), DisplayError> {
        self.start_cycle()?;

        let tubes = self.wiring.tube_count();
        let len = value
            .iter()
            .take(tubes)
            .position(|b| *b == 0)
            .unwrap_or(value.len().min(tubes));
        self.display_value[..len].copy_from_slice(&value[..len]);
        self.display_value[len..].fill(0);

        self.state = DisplayState::BeginDisplaySequence;
        Ok(())
    }

    /// Start a fetch cycle
    pub fn begin_fetch(&mut self) -> Result<(), DisplayError> {
        self.start_cycle()?;
        self.state = DisplayState::BeginHttpRequest;
        Ok(())
    }

    /// Advance the state machine
    pub fn poll(&mut self) {
        match self.state {
            DisplayState::Idle => {}
            DisplayState::Error => {
                self.state = DisplayState::Idle;
            }
            DisplayState::BeginHttpRequest => {
                self.state = DisplayState::AwaitingTransportReady;
            }
            DisplayState::AwaitingTransportReady => {
                if self.fetch.is_busy() {
                    return;
                }
                self.value_parsed = false;
                match self.fetch.request(&self.request_url) {
                    Ok(()) => {
                        debug!("request submitted");
                        self.state = DisplayState::AwaitingResponse;
                    }
                    Err(e) => {
                        error!("request failed: {}", e);
                        self.fail(PipelineFault::SubmitFailed(e));
                    }
                }
            }
            DisplayState::AwaitingResponse => {
                while let Some(event) = self.fetch.poll_event() {
                    let terminal = event.is_terminal();
                    match event {
                        FetchEvent::Chunk(data) => self.on_chunk(&data),
                        FetchEvent::Complete => self.on_complete(),
                        FetchEvent::Error(e) => self.on_error(e),
                    }
                    if terminal {
                        break;
                    }
                }
            }
            DisplayState::BeginDisplaySequence => {
                self.state = DisplayState::DecodeDisplayValue;
            }
            DisplayState::DecodeDisplayValue => {
                let tubes = self.wiring.tube_count();
                encode::decode(
                    &self.wiring,
                    &self.display_value[..tubes],
                    &mut self.cathode_index[..tubes],
                );
                trace!("cathodes {}", &self.cathode_index[..tubes]);
                self.state = DisplayState::EncodeShiftRegister;
            }
            DisplayState::EncodeShiftRegister => {
                let tubes = self.wiring.tube_count();
                let registers = self.wiring.shift_registers();
                encode::encode(
                    &self.wiring,
                    &self.cathode_index[..tubes],
                    &mut self.register_shift_state[..registers],
                );
                trace!("registers {:#x}", &self.register_shift_state[..registers]);
                self.state = DisplayState::WriteShiftRegister;
            }
            DisplayState::WriteShiftRegister => {
                if self.shift.is_busy() {
                    return;
                }
                let registers = self.wiring.shift_registers();
                self.shift.send(&self.register_shift_state[..registers]);
                self.state = DisplayState::Idle;
            }
        }
    }

    /// Scan one response fragment for the value
    ///
    /// Ignored outside a request and once a value has been taken.
    pub fn on_chunk(&mut self, data: &[u8]) {
        if self.state != DisplayState::AwaitingResponse || self.value_parsed {
            return;
        }

        let tubes = self.wiring.tube_count();
        if scan::extract_value(
            data,
            self.match_token.as_bytes(),
            &mut self.display_value[..tubes],
        ) {
            self.value_parsed = true;
            debug!("value {=[u8]:a}", &self.display_value[..tubes]);
        }
    }

    /// Response finished; show whatever was parsed
    pub fn on_complete(&mut self) {
        if self.state != DisplayState::AwaitingResponse {
            return;
        }
        if !self.value_parsed {
            warn!("token not found in response");
        }
        self.state = DisplayState::BeginDisplaySequence;
    }

    /// Request failed mid-transfer
    pub fn on_error(&mut self, e: FetchError) {
        if self.state != DisplayState::AwaitingResponse {
            return;
        }
        error!("transfer failed: {}", e);
        self.fail(PipelineFault::TransferFailed(e));
    }

    fn start_cycle(&mut self) -> Result<(), DisplayError> {
        if self.is_busy() {
            warn!("display busy in {}", self.state);
            return Err(DisplayError::Busy);
        }
        self.last_fault = None;
        Ok(())
    }

    fn fail(&mut self, fault: PipelineFault) {
        self.last_fault = Some(fault);
        self.state = DisplayState::Error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tube::NixieType;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::string::String as StdString;
    use std::vec::Vec as StdVec;

    #[derive(Default)]
    struct MockFetch {
        busy: bool,
        fail_with: Option<FetchError>,
        requests: StdVec<StdString>,
        events: VecDeque<FetchEvent>,
        calls: Cell<usize>,
    }

    impl MockFetch {
        fn queue(&mut self, event: FetchEvent) {
            self.events.push_back(event);
        }
    }

    impl FetchTransport for MockFetch {
        fn is_busy(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.busy
        }

        fn request(&mut self, url: &str) -> Result<(), FetchError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(e) = self.fail_with {
                return Err(e);
            }
            self.requests.push(url.into());
            Ok(())
        }

        fn poll_event(&mut self) -> Option<FetchEvent> {
            self.calls.set(self.calls.get() + 1);
            self.events.pop_front()
        }
    }

    #[derive(Default)]
    struct MockShift {
        busy: bool,
        sent: StdVec<StdVec<u8>>,
        calls: Cell<usize>,
    }

    impl ShiftRegisterTransport for MockShift {
        fn is_busy(&self) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.busy
        }

        fn send(&mut self, data: &[u8]) {
            self.calls.set(self.calls.get() + 1);
            self.sent.push(data.to_vec());
        }
    }

    fn appliance() -> DisplayPipeline<MockFetch, MockShift> {
        DisplayPipeline::from_config(
            &DisplayConfig::default(),
            MockFetch::default(),
            MockShift::default(),
        )
        .unwrap()
    }

    fn single_tube() -> DisplayPipeline<MockFetch, MockShift> {
        let mut wiring = WiringTable::new(2).unwrap();
        let tube = wiring.add_tube(NixieType::In12a).unwrap();
        wiring.connect(tube, 7, 0, 0).unwrap();
        DisplayPipeline::new(
            wiring,
            String::new(),
            String::new(),
            MockFetch::default(),
            MockShift::default(),
        )
    }

    fn run_until_idle(pipeline: &mut DisplayPipeline<MockFetch, MockShift>) -> usize {
        for polls in 1..=20 {
            pipeline.poll();
            if pipeline.state() == DisplayState::Idle {
                return polls;
            }
        }
        panic!("pipeline stuck in {:?}", pipeline.state());
    }

    #[test]
    fn test_idle_poll_touches_nothing() {
        let mut pipeline = appliance();
        for _ in 0..5 {
            pipeline.poll();
        }
        assert_eq!(pipeline.state(), DisplayState::Idle);
        assert_eq!(pipeline.fetch().calls.get(), 0);
        assert_eq!(pipeline.shift().calls.get(), 0);
    }

    #[test]
    fn test_display_encodes_single_cathode() {
        let mut pipeline = single_tube();
        pipeline.display(b"5").unwrap();
        assert_eq!(pipeline.state(), DisplayState::BeginDisplaySequence);

        assert_eq!(run_until_idle(&mut pipeline), 4);
        assert_eq!(pipeline.shift().sent, vec![vec![0x01, 0x00]]);
        assert_eq!(pipeline.register_state(), &[0x01, 0x00]);
        assert_eq!(pipeline.fetch().calls.get(), 0);
    }

    #[test]
    fn test_display_stops_at_nul_and_pads() {
        let mut pipeline = appliance();
        pipeline.display(b"7\0\x39").unwrap();
        assert_eq!(pipeline.display_value(), b"7\0\0\0");

        run_until_idle(&mut pipeline);
        pipeline.display(b"123456").unwrap();
        assert_eq!(pipeline.display_value(), b"1234");
    }

    #[test]
    fn test_busy_gating() {
        let mut pipeline = appliance();
        pipeline.display(b"11").unwrap();
        let before = [pipeline.display_value()[0], pipeline.display_value()[1]];

        assert_eq!(pipeline.display(b"99"), Err(DisplayError::Busy));
        assert_eq!(pipeline.begin_fetch(), Err(DisplayError::Busy));
        assert_eq!(pipeline.state(), DisplayState::BeginDisplaySequence);
        assert_eq!(&pipeline.display_value()[..2], &before);
        assert_eq!(pipeline.fetch().calls.get(), 0);
        assert_eq!(pipeline.shift().calls.get(), 0);
    }

    #[test]
    fn test_fetch_cycle_shows_first_match() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().queue(FetchEvent::chunk(b"<html><head>"));
        pipeline
            .fetch_mut()
            .queue(FetchEvent::chunk(b"<li>>Open Tasks (42)</li>"));
        pipeline
            .fetch_mut()
            .queue(FetchEvent::chunk(b"<li>>Open Tasks (99)</li>"));
        pipeline.fetch_mut().queue(FetchEvent::Complete);

        pipeline.begin_fetch().unwrap();
        assert_eq!(run_until_idle(&mut pipeline), 7);

        assert_eq!(pipeline.fetch().requests, vec!["http://developer.blender.org/"]);
        assert!(pipeline.value_parsed());
        assert_eq!(pipeline.display_value(), b"42\0\0");
        // '4' is cathode 8 on tube 0 (output 6), '2' is cathode 10 on tube 1 (output 18)
        assert_eq!(
            pipeline.shift().sent,
            vec![vec![0x40, 0x00, 0x04, 0x00, 0x00, 0x00]]
        );
    }

    #[test]
    fn test_fetch_cycle_truncates_at_non_digit() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().queue(FetchEvent::chunk(b">Open Tasks (12a9"));
        pipeline.fetch_mut().queue(FetchEvent::Complete);

        pipeline.begin_fetch().unwrap();
        run_until_idle(&mut pipeline);
        assert_eq!(pipeline.display_value(), b"12\0\0");
    }

    #[test]
    fn test_waits_for_fetch_transport() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().busy = true;
        pipeline.begin_fetch().unwrap();

        for _ in 0..5 {
            pipeline.poll();
        }
        assert_eq!(pipeline.state(), DisplayState::AwaitingTransportReady);
        assert!(pipeline.fetch().requests.is_empty());

        pipeline.fetch_mut().busy = false;
        pipeline.poll();
        assert_eq!(pipeline.state(), DisplayState::AwaitingResponse);
        assert_eq!(pipeline.fetch().requests.len(), 1);
    }

    #[test]
    fn test_waits_for_shift_transport() {
        let mut pipeline = single_tube();
        pipeline.shift_mut().busy = true;
        pipeline.display(b"5").unwrap();

        for _ in 0..6 {
            pipeline.poll();
        }
        assert_eq!(pipeline.state(), DisplayState::WriteShiftRegister);
        assert!(pipeline.shift().sent.is_empty());

        pipeline.shift_mut().busy = false;
        pipeline.poll();
        assert_eq!(pipeline.state(), DisplayState::Idle);
        assert_eq!(pipeline.shift().sent.len(), 1);
    }

    #[test]
    fn test_submit_failure_latches_fault() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().fail_with = Some(FetchError::Unsupported);
        pipeline.begin_fetch().unwrap();

        pipeline.poll();
        pipeline.poll();
        assert_eq!(pipeline.state(), DisplayState::Error);
        assert_eq!(
            pipeline.last_fault(),
            Some(PipelineFault::SubmitFailed(FetchError::Unsupported))
        );

        // Error lasts one tick, the fault stays latched
        pipeline.poll();
        assert_eq!(pipeline.state(), DisplayState::Idle);
        assert!(pipeline.last_fault().is_some());

        pipeline.fetch_mut().fail_with = None;
        pipeline.begin_fetch().unwrap();
        assert_eq!(pipeline.last_fault(), None);
    }

    #[test]
    fn test_transfer_error_skips_display() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().queue(FetchEvent::chunk(b">Open Tasks (42)..."));
        pipeline
            .fetch_mut()
            .queue(FetchEvent::Error(FetchError::Transport));
        pipeline.begin_fetch().unwrap();

        for _ in 0..3 {
            pipeline.poll();
        }
        assert_eq!(pipeline.state(), DisplayState::Error);
        assert_eq!(
            pipeline.last_fault(),
            Some(PipelineFault::TransferFailed(FetchError::Transport))
        );
        pipeline.poll();
        assert_eq!(pipeline.state(), DisplayState::Idle);
        assert!(pipeline.shift().sent.is_empty());
    }

    #[test]
    fn test_complete_without_match_keeps_value() {
        let mut pipeline = appliance();
        pipeline.display(b"8888").unwrap();
        run_until_idle(&mut pipeline);

        pipeline.fetch_mut().queue(FetchEvent::chunk(b"503 Service Unavailable"));
        pipeline.fetch_mut().queue(FetchEvent::Complete);
        pipeline.begin_fetch().unwrap();
        run_until_idle(&mut pipeline);

        // Value is kept from before; the new request never overwrote it
        assert!(!pipeline.value_parsed());
        assert_eq!(pipeline.display_value(), b"8888");
        assert_eq!(pipeline.shift().sent.len(), 2);
    }

    #[test]
    fn test_events_outside_request_ignored() {
        let mut pipeline = appliance();
        pipeline.on_chunk(b">Open Tasks (1234)");
        pipeline.on_complete();
        pipeline.on_error(FetchError::Connect);

        assert_eq!(pipeline.state(), DisplayState::Idle);
        assert!(!pipeline.value_parsed());
        assert_eq!(pipeline.display_value(), &[0, 0, 0, 0]);
        assert_eq!(pipeline.last_fault(), None);
    }

    #[test]
    fn test_events_after_terminal_left_queued() {
        let mut pipeline = appliance();
        pipeline.fetch_mut().queue(FetchEvent::Complete);
        pipeline.fetch_mut().queue(FetchEvent::chunk(b"stale"));
        pipeline.begin_fetch().unwrap();

        for _ in 0..3 {
            pipeline.poll();
        }
        assert_eq!(pipeline.state(), DisplayState::BeginDisplaySequence);
        assert_eq!(pipeline.fetch().events.len(), 1);
    }
}
