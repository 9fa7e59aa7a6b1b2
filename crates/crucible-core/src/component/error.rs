use thiserror::Error;

/// Error raised while building or registering a component model
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Component name must not be empty")]
    EmptyName,

    #[error("Component '{0}' has no constructor binding")]
    MissingConstructor(String),

    #[error("Component '{0}' declares the custom lifestyle but supplies no lifestyle factory")]
    MissingLifestyleFactory(String),

    #[error("Component '{0}' declares a pooled lifestyle with zero capacity")]
    ZeroPoolCapacity(String),

    #[error("Component '{component}' declares dependency key '{key}' more than once")]
    DuplicateDependencyKey { component: String, key: String },

    #[error("Component already registered: {0}")]
    DuplicateKey(String),
}

/// Error raised by typed access to resolved constructor arguments
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// No dependency was declared under this key
    #[error("No dependency declared under key '{0}'")]
    Undeclared(String),

    /// The dependency is optional and no provider was available
    #[error("Dependency '{0}' was not resolved")]
    Missing(String),

    /// The stored instance is not of the requested type
    #[error("Dependency '{key}' is not an instance of {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}
