use crate::{
    error::AppError,
    models::{InteractionsRequest, OneOrMany},
};

pub struct Lookup {
    pub uid: String,
    pub drugs: Vec<String>,
    pub foods: Vec<String>,
}

const MISSING_FIELDS: &str = "uid, drug and food are required";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// An empty list, or a list holding an empty name, counts as missing.
fn names(value: Option<OneOrMany<String>>) -> Option<Vec<String>> {
    value
        .map(OneOrMany::into_vec)
        .filter(|names| !names.is_empty() && names.iter().all(|n| !n.is_empty()))
}

pub fn get_lookup(payload: InteractionsRequest) -> Result<Lookup, AppError> {
    match (
        non_empty(payload.uid),
        names(payload.drug),
        names(payload.food),
    ) {
        (Some(uid), Some(drugs), Some(foods)) => Ok(Lookup { uid, drugs, foods }),
        _ => Err(AppError::Validation(MISSING_FIELDS.to_string())),
    }
}

pub fn get_uid(uid: Option<String>) -> Result<String, AppError> {
    non_empty(uid).ok_or_else(|| AppError::Validation("uid is required".to_string()))
}
