//! Admin Error Types

use fc_common::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Plan {id} is referenced by at least one company")]
    PlanInUse { id: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Toast text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            AdminError::Validation(errors) => errors.join("\n"),
            AdminError::NotFound { entity_type, .. } if entity_type == "Company" => {
                "Empresa não encontrada".to_string()
            }
            AdminError::NotFound { entity_type, .. } if entity_type == "Plan" => {
                "Plano não encontrado".to_string()
            }
            AdminError::NotFound { .. } => "Registro não encontrado".to_string(),
            AdminError::PlanInUse { .. } => {
                "Não é possível deletar um plano que está sendo usado por empresas".to_string()
            }
            AdminError::Store(StoreError::Rejected { message, .. }) => message.clone(),
            AdminError::Store(_) => {
                "Não foi possível comunicar com o servidor. Tente novamente.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AdminError::not_found("Company", "c-1").user_message(),
            "Empresa não encontrada"
        );
        assert!(AdminError::PlanInUse { id: "p".into() }
            .user_message()
            .contains("sendo usado"));
        assert_eq!(
            AdminError::Store(StoreError::rejected(409, "duplicate key value")).user_message(),
            "duplicate key value"
        );
        assert_eq!(
            AdminError::Validation(vec!["a".into(), "b".into()]).user_message(),
            "a\nb"
        );
    }
}
