//! The DKLS engine port.
//!
//! Reference: spec.md §4.3 — "A session object exposes InputMessage(bytes)
//! -> ok|err, Step() -> (outMsgs[], finished, err), GetResult() ->
//! {keyshare, publicKey, signature, participants} | err, Close()."
//!
//! The concrete cryptographic engine is out of scope (spec.md §1);
//! production wiring supplies a real adapter, grounded on the teacher's
//! pattern of treating external cryptographic engines as an injected port.

use shared_types::Address;

/// One outgoing protocol message produced by a [`DklsSession::step`] call.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Recipient party.
    pub to: Address,
    /// Raw DKLS protocol bytes.
    pub payload: Vec<u8>,
}

/// The result of driving a session one step forward.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Messages to route to other participants.
    pub out_messages: Vec<OutgoingMessage>,
    /// `true` once the ceremony has produced a final result.
    pub finished: bool,
}

/// The final output of a completed session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// The resulting keyshare, for key-ceremony sessions.
    pub keyshare: Option<Vec<u8>>,
    /// The (possibly unchanged) TSS public key.
    pub public_key: Vec<u8>,
    /// The produced signature, for `SIGN` sessions. A trailing recovery
    /// byte is included where the destination chain requires one.
    pub signature: Option<Vec<u8>>,
    /// The participant set that actually produced this result.
    pub participants: Vec<Address>,
}

/// A running DKLS protocol engine for one session.
///
/// `Step()` is not safe to call concurrently with itself; the session
/// manager serializes calls per session via its own mutex rather than
/// requiring this trait to be internally synchronized. Dropping a session
/// releases its cryptographic state; there is no separate `close` method
/// to call.
pub trait DklsSession: Send {
    /// Feed a raw protocol payload received from another participant.
    fn input_message(&mut self, from: &Address, payload: &[u8]) -> Result<(), String>;

    /// Drive the protocol forward one step.
    fn step(&mut self) -> Result<StepOutcome, String>;

    /// Read the final result. Only meaningful once a `step()` call
    /// reported `finished`.
    fn get_result(&self) -> Result<SessionResult, String>;
}

/// Builds [`DklsSession`] engines for a given protocol type.
///
/// Reference: spec.md §4.3 — the four construction rules per protocol
/// type (participants, threshold, prior keyshare handling) are the
/// factory's responsibility; the session manager only calls it with the
/// already-validated participant set.
pub trait DklsSessionFactory: Send + Sync {
    /// Construct a new session engine.
    ///
    /// `prior_keyshare` is `None` for `KEYGEN`, the existing keyshare for
    /// `KEYREFRESH`, possibly `None` for a joining party under
    /// `QUORUM_CHANGE`, and `None` for `SIGN` (the keyshare is loaded
    /// internally by the engine from the TSS key ID).
    fn create(
        &self,
        participants: &[Address],
        threshold: u64,
        prior_keyshare: Option<Vec<u8>>,
    ) -> Result<Box<dyn DklsSession>, String>;
}
