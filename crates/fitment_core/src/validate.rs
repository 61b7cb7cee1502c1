use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter VM names")]
    EmptyInput,
}

/// Ordered, non-empty list of trimmed target names. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetList(Vec<String>);

impl TargetList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Splits raw input on commas, trims each element and drops the empty ones.
pub fn validate(raw: &str) -> Result<TargetList, ValidationError> {
    let targets: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|target| !target.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    if targets.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    Ok(TargetList(targets))
}
