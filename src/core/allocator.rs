use crate::core::financial_year::financial_year_for;
use crate::core::formatter::format_gate_pass_number;
use crate::domain::model::{
    AllocatedGatePass, FinancialYear, GatePassGenerateRequest, PassType, Role, SequenceCounter,
    SequenceUpdate, YearSequence,
};
use crate::domain::ports::{Clock, SequenceStore, SystemClock};
use crate::utils::error::{GatePassError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_required_field};

/// Entry points used by gate pass issuance and the admin screens.
///
/// Every call goes straight to the store; the service holds no counter state
/// of its own, so any number of instances may share one database.
pub struct GatePassService<S: SequenceStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SequenceStore> GatePassService<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: SystemClock,
        }
    }
}

impl<S: SequenceStore, C: Clock> GatePassService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn current_financial_year(&self) -> FinancialYear {
        financial_year_for(self.clock.today())
    }

    /// Low-level allocation for an explicit key.
    pub async fn allocate(&self, financial_year: FinancialYear, pass_type: PassType) -> Result<u32> {
        match self.store.allocate(financial_year, pass_type).await {
            Ok(sequence) => Ok(sequence),
            Err(e) => {
                tracing::error!(
                    "❌ Failed to allocate {} sequence for {}: {}",
                    pass_type,
                    financial_year,
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn allocate_gate_pass_number(&self, is_returnable: bool) -> Result<AllocatedGatePass> {
        let financial_year = self.current_financial_year();
        let pass_type = PassType::from_returnable(is_returnable);

        let sequence_number = self.allocate(financial_year, pass_type).await?;
        let gate_pass_number = format_gate_pass_number(pass_type, financial_year, sequence_number);

        tracing::info!("🎫 Issued gate pass {}", gate_pass_number);

        Ok(AllocatedGatePass {
            gate_pass_number,
            financial_year,
            pass_type,
            sequence_number,
        })
    }

    pub async fn generate(&self, request: &GatePassGenerateRequest) -> Result<AllocatedGatePass> {
        self.allocate_gate_pass_number(request.is_returnable).await
    }

    pub async fn list_sequences(&self, role: Role) -> Result<Vec<SequenceCounter>> {
        require_privileged(role, "view all gate pass sequences")?;
        self.store.list().await
    }

    pub async fn list_sequences_by_year(&self, financial_year: &str) -> Result<Vec<YearSequence>> {
        validate_non_empty_string("financial_year", financial_year)?;
        let financial_year: FinancialYear = financial_year.trim().parse()?;

        let counters = self.store.list_by_year(financial_year).await?;
        Ok(counters.into_iter().map(YearSequence::from).collect())
    }

    /// Administrative override of a counter.
    ///
    /// Callers must keep allocation for the same key quiet while overriding;
    /// an override racing an allocation can hand out a number twice.
    pub async fn update_sequence(&self, role: Role, id: i64, new_value: u32) -> Result<SequenceCounter> {
        require_privileged(role, "update gate pass sequences")?;

        let updated = self.store.set_sequence(id, new_value).await?;
        tracing::warn!(
            "🔧 Sequence {} ({} {}) overridden to {} by {}",
            id,
            updated.financial_year,
            updated.pass_type,
            new_value,
            role
        );
        Ok(updated)
    }

    pub async fn apply_update(&self, role: Role, id: i64, update: &SequenceUpdate) -> Result<SequenceCounter> {
        require_privileged(role, "update gate pass sequences")?;
        let new_value = *validate_required_field("current_sequence", &update.current_sequence)?;
        self.update_sequence(role, id, new_value).await
    }
}

fn require_privileged(role: Role, operation: &str) -> Result<()> {
    if role.is_privileged() {
        return Ok(());
    }
    tracing::warn!("🚫 Role {} denied: {}", role, operation);
    Err(GatePassError::AuthorizationError {
        role: role.to_string(),
        operation: operation.to_string(),
    })
}
