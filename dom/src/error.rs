//! `DOMException`-shaped errors.
//!
//! SPECLINK: <https://webidl.spec.whatwg.org/#idl-DOMException>

use std::fmt;

/// A DOM error: a stable `name`, a human-readable `message`, and the legacy
/// numeric `code` the web platform still exposes.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct DomException {
    pub name: ErrorName,
    pub message: &'static str,
    pub code: u16,
}

impl DomException {
    const fn new(name: ErrorName, message: &'static str, code: u16) -> Self {
        Self {
            name,
            message,
            code,
        }
    }

    pub const INDEX_SIZE_ERR: u16 = 1;
    pub const HIERARCHY_REQUEST_ERR: u16 = 3;
    pub const WRONG_DOCUMENT_ERR: u16 = 4;
    pub const INVALID_CHARACTER_ERR: u16 = 5;
    pub const NOT_FOUND_ERR: u16 = 8;
    pub const NOT_SUPPORTED_ERR: u16 = 9;
    pub const INUSE_ATTRIBUTE_ERR: u16 = 10;
    pub const INVALID_STATE_ERR: u16 = 11;
    pub const SYNTAX_ERR: u16 = 12;
    pub const INVALID_MODIFICATION_ERR: u16 = 13;
    pub const NAMESPACE_ERR: u16 = 14;
    pub const INVALID_ACCESS_ERR: u16 = 15;
    pub const ABORT_ERR: u16 = 20;
}

impl fmt::Display for DomException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.name, self.message)
    }
}

impl std::error::Error for DomException {}

impl From<ErrorName> for DomException {
    fn from(value: ErrorName) -> Self {
        match value {
            ErrorName::IndexSizeError => DomException::new(
                value,
                "The index is not in the allowed range.",
                DomException::INDEX_SIZE_ERR,
            ),
            ErrorName::HierarchyRequestError => DomException::new(
                value,
                "The operation would yield an incorrect node tree.",
                DomException::HIERARCHY_REQUEST_ERR,
            ),
            ErrorName::WrongDocumentError => DomException::new(
                value,
                "The object is in the wrong document.",
                DomException::WRONG_DOCUMENT_ERR,
            ),
            ErrorName::InvalidCharacterError => DomException::new(
                value,
                "The string contains invalid characters.",
                DomException::INVALID_CHARACTER_ERR,
            ),
            ErrorName::NotFoundError => DomException::new(
                value,
                "The object can not be found here.",
                DomException::NOT_FOUND_ERR,
            ),
            ErrorName::NotSupportedError => DomException::new(
                value,
                "The operation is not supported.",
                DomException::NOT_SUPPORTED_ERR,
            ),
            ErrorName::InUseAttributeError => DomException::new(
                value,
                "The attribute is in use by another element.",
                DomException::INUSE_ATTRIBUTE_ERR,
            ),
            ErrorName::InvalidStateError => DomException::new(
                value,
                "The object is in an invalid state.",
                DomException::INVALID_STATE_ERR,
            ),
            ErrorName::SyntaxError => DomException::new(
                value,
                "The string did not match the expected pattern.",
                DomException::SYNTAX_ERR,
            ),
            ErrorName::InvalidModificationError => DomException::new(
                value,
                "The object can not be modified in this way.",
                DomException::INVALID_MODIFICATION_ERR,
            ),
            ErrorName::NamespaceError => DomException::new(
                value,
                "The operation is not allowed by Namespaces in XML.",
                DomException::NAMESPACE_ERR,
            ),
            ErrorName::InvalidAccessError => DomException::new(
                value,
                "The object does not support the operation or argument.",
                DomException::INVALID_ACCESS_ERR,
            ),
            ErrorName::AbortError => {
                DomException::new(value, "The operation was aborted.", DomException::ABORT_ERR)
            }
            ErrorName::InvalidNodeTypeError => DomException::new(
                value,
                "The supplied node is incorrect or has an incorrect ancestor for this operation.",
                0,
            ),
        }
    }
}

/// SPECLINK: <https://webidl.spec.whatwg.org/#dfn-error-names-table>
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum ErrorName {
    IndexSizeError,
    HierarchyRequestError,
    WrongDocumentError,
    InvalidCharacterError,
    NotFoundError,
    NotSupportedError,
    InUseAttributeError,
    InvalidStateError,
    SyntaxError,
    InvalidModificationError,
    NamespaceError,
    InvalidAccessError,
    AbortError,
    InvalidNodeTypeError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_webidl_table() {
        assert_eq!(DomException::from(ErrorName::HierarchyRequestError).code, 3);
        assert_eq!(DomException::from(ErrorName::NotFoundError).code, 8);
        assert_eq!(DomException::from(ErrorName::AbortError).code, 20);
    }

    #[test]
    fn implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomException::from(ErrorName::SyntaxError));
        assert!(err.to_string().contains("SyntaxError"));
    }
}
