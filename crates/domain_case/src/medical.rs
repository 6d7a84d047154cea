//! Medical bills incurred by clients

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, MedicalBillId, ProviderId};

/// A bill from a treating provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalBill {
    pub id: MedicalBillId,
    /// Client who received the treatment
    pub client_id: ClientId,
    pub provider_id: Option<ProviderId>,
    pub provider_name: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub amount_billed: Decimal,
    pub amount_paid: Decimal,
    /// Write-offs and contractual reductions
    pub adjustments: Decimal,
}

impl MedicalBill {
    /// Amount still owed to the provider
    pub fn balance(&self) -> Decimal {
        self.amount_billed - self.amount_paid - self.adjustments
    }
}
