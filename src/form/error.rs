use std::fmt;

#[derive(Debug)]
pub enum FormError {
    /// Two fields in the schema share a key
    DuplicateField(String),

    /// A field key collides with a device context key in the report
    ReservedKey(String),

    /// A field requires a key that no field declares
    UnknownDependency { field: String, requires: String },

    /// The `requires` graph loops back on itself
    DependencyCycle(Vec<String>),

    /// A field declares a widget variant more than once
    DuplicateWidget { field: String, widget: &'static str },

    /// A button field with no label at all
    MissingLabel(String),

    /// The start screen has nothing to choose from
    NoStartOptions,

    /// Config file exists but could not be read
    ConfigRead { path: String, source: std::io::Error },

    /// Config file is not valid YAML for the expected shape
    ConfigParse { path: String, source: serde_yaml::Error },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::DuplicateField(key) => {
                write!(f, "Field '{}' is declared more than once", key)
            }
            FormError::ReservedKey(key) => {
                write!(f, "Field key '{}' is reserved for device context", key)
            }
            FormError::UnknownDependency { field, requires } => {
                write!(f, "Field '{}' requires unknown field '{}'", field, requires)
            }
            FormError::DependencyCycle(path) => {
                write!(f, "Dependency cycle: {}", path.join(" -> "))
            }
            FormError::DuplicateWidget { field, widget } => {
                write!(f, "Field '{}' declares more than one {} widget", field, widget)
            }
            FormError::MissingLabel(key) => {
                write!(f, "Button for field '{}' has no label", key)
            }
            FormError::NoStartOptions => {
                write!(f, "Start screen needs at least one category option")
            }
            FormError::ConfigRead { path, source } => {
                write!(f, "Could not read config '{}': {}", path, source)
            }
            FormError::ConfigParse { path, source } => {
                write!(f, "Invalid config '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for FormError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormError::ConfigRead { source, .. } => Some(source),
            FormError::ConfigParse { source, .. } => Some(source),
            _ => None,
        }
    }
}
