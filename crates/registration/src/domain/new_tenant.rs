use common::domain::{DomainError, DomainResult, Plan};
use common::garde::validate_struct;
use garde::Validate;
use serde::{Deserialize, Serialize};

fn known_plan(value: &str, _ctx: &()) -> garde::Result {
    value
        .parse::<Plan>()
        .map(|_| ())
        .map_err(|_| garde::Error::new("must be one of basic, premium"))
}

/// Registration request for a new tenant and its account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    #[garde(length(min = 1))]
    pub id: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub first_name: String,
    #[garde(length(min = 1))]
    pub last_name: String,
    #[garde(length(min = 1))]
    pub company_name: String,
    #[garde(custom(known_plan))]
    pub plan: String,
}

impl NewTenant {
    pub fn validate_request(&self) -> DomainResult<()> {
        validate_struct(self)
    }

    /// The validated plan.
    pub fn plan(&self) -> DomainResult<Plan> {
        self.plan
            .parse()
            .map_err(|e: String| DomainError::validation("plan", e))
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
