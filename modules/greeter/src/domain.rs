use crate::contract::GreeterApi;

/// Longest accepted name, in characters.
pub(crate) const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone)]
pub(crate) struct GreeterService {
    salutation: String,
}

impl GreeterService {
    pub(crate) fn new(salutation: impl Into<String>) -> Self {
        Self {
            salutation: salutation.into(),
        }
    }

    /// Reject names that are blank or too long.
    pub(crate) fn validate_name(name: &str) -> Result<&str, String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("name must not be blank".to_owned());
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(format!(
                "name \"{trimmed}\" is longer than {MAX_NAME_LEN} characters"
            ));
        }
        Ok(trimmed)
    }
}

impl GreeterApi for GreeterService {
    fn greet(&self, name: &str) -> String {
        format!("{}, {name}!", self.salutation)
    }

    fn salutation(&self) -> &str {
        &self.salutation
    }
}
