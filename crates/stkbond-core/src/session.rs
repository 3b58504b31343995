//! Bond form session.
//!
//! A [`BondSession`] owns one [`BondRequest`] for the lifetime of a form.
//! Every change goes through [`BondSession::transition`], which recomputes
//! the amount and validity before returning, so a reader never observes a
//! half-updated request.

use rust_decimal::Decimal;

use crate::amount::format_balance;
use crate::options::BondSnapshot;
use crate::resolver::{self, BondRequest, BondTransaction, BuildRefusal};
use crate::strategy;
use crate::types::{AccountBondState, ActionKind, Balance, StakingMode};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Form is open and accepts edits.
    Editing,
    /// A transaction has been handed to the submitter.
    Submitting,
    /// Submission was broadcast and the form closed.
    Closed,
    /// User backed out; nothing was built.
    Discarded,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Closed | SessionPhase::Discarded)
    }
}

/// Input to [`BondSession::transition`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SelectAction(ActionKind),
    SelectMode(StakingMode),
    /// User edited the amount input.
    EditAmount(Decimal),
    /// Balance provider delivered fresh data.
    Refresh(BondSnapshot),
    ClientAvailable(bool),
    FeeEstimated(Option<Balance>),
    /// Transaction was broadcast.
    Broadcast,
    /// Transaction was included in a block.
    InBlock,
    SubmissionFailed(String),
    Back,
}

/// Message shown next to a disabled submit button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    NoFreeFunds { symbol: String },
    ControllerNotImported,
    StopNominating,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::NoFreeFunds { symbol } => write!(f, "You have no free {} to bond.", symbol),
            Advisory::ControllerNotImported => {
                write!(
                    f,
                    "You must have your controller account imported to unbond."
                )
            }
            Advisory::StopNominating => write!(f, "Stop nominating before unbonding all funds."),
        }
    }
}

/// Failure to hand a transaction to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Submission rejected: {0}")]
pub struct SubmitError(pub String);

/// Error returned by [`BondSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A submission is already in flight")]
    AlreadySubmitting,
    #[error("Session is closed")]
    Closed,
    #[error(transparent)]
    Refused(#[from] BuildRefusal),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Receives built transactions for signing and broadcast.
///
/// `submit` only queues the request. Progress comes back to the session as
/// [`SessionEvent::Broadcast`], [`SessionEvent::InBlock`] or
/// [`SessionEvent::SubmissionFailed`].
pub trait TxSubmitter {
    fn submit(&mut self, tx: BondTransaction) -> Result<(), SubmitError>;
}

pub const UNBONDING_NOTE: &str =
    "Once unbonding, you must wait 28 days for your funds to become available.";

type CloseHook = Box<dyn FnMut() + Send>;

/// State of one bond form.
pub struct BondSession {
    mode: StakingMode,
    action: ActionKind,
    snapshot: BondSnapshot,
    client_available: bool,
    request: BondRequest,
    phase: SessionPhase,
    estimated_fee: Option<Balance>,
    /// A snapshot arrived while submitting.
    refresh_pending: bool,
    on_close: Option<CloseHook>,
}

impl std::fmt::Debug for BondSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondSession")
            .field("mode", &self.mode)
            .field("action", &self.action)
            .field("request", &self.request)
            .field("phase", &self.phase)
            .field("estimated_fee", &self.estimated_fee)
            .finish_non_exhaustive()
    }
}

impl BondSession {
    /// Open a session with `action` selected.
    pub fn new(
        mode: StakingMode,
        action: ActionKind,
        snapshot: BondSnapshot,
        client_available: bool,
    ) -> Self {
        let mut session = Self {
            mode,
            action,
            snapshot,
            client_available,
            request: BondRequest::default(),
            phase: SessionPhase::Editing,
            estimated_fee: None,
            refresh_pending: false,
            on_close: None,
        };
        session.reset_amount();
        session
    }

    /// Callback run when a broadcast closes the form.
    pub fn with_close_hook(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Apply one event and recompute the derived fields.
    pub fn transition(&mut self, event: SessionEvent) -> SessionPhase {
        if self.phase.is_terminal() {
            tracing::debug!("Ignoring {:?} on {:?} session", event, self.phase);
            return self.phase;
        }

        match event {
            SessionEvent::SelectAction(action) if self.phase == SessionPhase::Editing => {
                self.action = action;
                self.reset_amount();
            }
            SessionEvent::SelectMode(mode) if self.phase == SessionPhase::Editing => {
                self.mode = mode;
                self.reset_amount();
            }
            SessionEvent::EditAmount(amount) if self.phase == SessionPhase::Editing => {
                if self.action.is_editable() {
                    self.request.amount = amount.max(Decimal::ZERO);
                    self.revalidate();
                } else {
                    tracing::debug!("{} amount is fixed, ignoring edit", self.action);
                }
            }
            SessionEvent::Refresh(snapshot) => {
                self.snapshot = snapshot;
                if self.phase == SessionPhase::Editing {
                    self.apply_refresh();
                } else {
                    tracing::debug!("Deferring {} refresh while submitting", self.action);
                    self.refresh_pending = true;
                }
            }
            SessionEvent::ClientAvailable(available) => self.client_available = available,
            SessionEvent::FeeEstimated(fee) => self.estimated_fee = fee,
            SessionEvent::Broadcast if self.phase == SessionPhase::Submitting => {
                tracing::info!("{} broadcast, closing form", self.action);
                self.phase = SessionPhase::Closed;
                if let Some(hook) = self.on_close.as_mut() {
                    hook();
                }
            }
            SessionEvent::InBlock => tracing::info!("{} included in block", self.action),
            SessionEvent::SubmissionFailed(reason) if self.phase == SessionPhase::Submitting => {
                tracing::warn!("{} submission failed: {}", self.action, reason);
                self.phase = SessionPhase::Editing;
                if std::mem::take(&mut self.refresh_pending) {
                    self.apply_refresh();
                }
            }
            SessionEvent::Back => {
                tracing::debug!("Discarding {} request", self.action);
                self.phase = SessionPhase::Discarded;
            }
            other => tracing::debug!("Ignoring {:?} while {:?}", other, self.phase),
        }
        self.phase
    }

    /// Discard the request without building anything.
    pub fn back(&mut self) -> SessionPhase {
        self.transition(SessionEvent::Back)
    }

    /// Build the transaction and hand it to `submitter`.
    pub fn submit(
        &mut self,
        submitter: &mut impl TxSubmitter,
    ) -> Result<BondTransaction, SessionError> {
        match self.phase {
            SessionPhase::Editing => {}
            SessionPhase::Submitting => return Err(SessionError::AlreadySubmitting),
            SessionPhase::Closed | SessionPhase::Discarded => return Err(SessionError::Closed),
        }

        let tx = self.preview()?;
        submitter.submit(tx.clone())?;

        tracing::info!(
            "Submitted {} signed by {:?}",
            tx.call.description(),
            tx.signer_role
        );
        self.phase = SessionPhase::Submitting;
        Ok(tx)
    }

    /// The transaction `submit` would hand over, without submitting it.
    pub fn preview(&self) -> Result<BondTransaction, BuildRefusal> {
        let env = self.snapshot.build_env(self.client_available);
        resolver::try_build(self.mode, self.action, &self.request, self.state(), &env)
    }

    fn reset_amount(&mut self) {
        self.request.amount =
            resolver::propose(self.action, self.mode, self.state(), self.snapshot.units);
        self.estimated_fee = None;
        self.revalidate();
        tracing::debug!(
            "{} {} proposes {} (valid: {})",
            self.mode,
            self.action,
            self.request.amount,
            self.request.valid
        );
    }

    fn apply_refresh(&mut self) {
        if self.action.is_editable() {
            self.revalidate();
        } else {
            self.reset_amount();
        }
    }

    fn revalidate(&mut self) {
        self.request.valid = resolver::validate(
            self.action,
            self.mode,
            self.state(),
            self.request.amount,
            self.snapshot.units,
        );
    }

    pub fn mode(&self) -> StakingMode {
        self.mode
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn request(&self) -> &BondRequest {
        &self.request
    }

    pub fn amount(&self) -> Decimal {
        self.request.amount
    }

    pub fn is_valid(&self) -> bool {
        self.request.valid
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == SessionPhase::Submitting
    }

    pub fn snapshot(&self) -> &BondSnapshot {
        &self.snapshot
    }

    /// Bond options for the current mode.
    pub fn state(&self) -> &AccountBondState {
        self.snapshot.state(self.mode)
    }

    /// Upper bound of the amount input, `None` when the amount is fixed.
    pub fn max_amount(&self) -> Option<Decimal> {
        strategy::lookup(self.mode, self.action).max_amount(self.state(), self.snapshot.units)
    }

    pub fn submit_disabled(&self) -> bool {
        self.phase != SessionPhase::Editing || !self.request.valid
    }

    pub fn advisories(&self) -> Vec<Advisory> {
        let state = self.state();
        let direct = self.mode == StakingMode::Direct;
        let mut advisories = Vec::new();

        if self.action == ActionKind::BondAll && !state.has_free_to_bond() {
            advisories.push(Advisory::NoFreeFunds {
                symbol: self.snapshot.symbol.clone(),
            });
        }
        if direct && self.action.is_unbond() && !state.controller_imported {
            advisories.push(Advisory::ControllerNotImported);
        }
        if direct && self.action == ActionKind::UnbondAll && state.is_nominating() {
            advisories.push(Advisory::StopNominating);
        }
        advisories
    }

    pub fn estimated_fee(&self) -> Option<Balance> {
        self.estimated_fee
    }

    /// Whether the fee line is shown; unbond-all hides it until valid.
    pub fn show_fee(&self) -> bool {
        self.action != ActionKind::UnbondAll || self.request.valid
    }

    pub fn fee_label(&self) -> String {
        match self.estimated_fee {
            Some(fee) => format!(
                "Estimated Tx Fee: {}",
                format_balance(fee, self.snapshot.units, &self.snapshot.symbol)
            ),
            None => "Estimated Tx Fee: ...".to_string(),
        }
    }

    /// Notes shown under the form: the fee line, then the unbonding delay.
    pub fn notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.show_fee() {
            notes.push(self.fee_label());
        }
        if self.action.is_unbond() {
            notes.push(UNBONDING_NOTE.to_string());
        }
        notes
    }
}
