use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Invalid-input faults raised before any arithmetic is attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum NnError {
    /// Two dimensions that must agree do not.
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    /// A label outside `[0, num_classes)`.
    LabelOutOfRange {
        index: usize,
        label: usize,
        num_classes: usize,
    },
    /// A batch with no examples; averaging over it would divide by zero.
    EmptyBatch { context: &'static str },
    /// A hyper-parameter the network or trainer cannot work with.
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },
}

impl Display for NnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnError::ShapeMismatch {
                context,
                expected,
                got,
            } => write!(
                f,
                "shape mismatch in {context}: expected {expected:?}, got {got:?}"
            ),
            NnError::LabelOutOfRange {
                index,
                label,
                num_classes,
            } => write!(
                f,
                "label {label} at position {index} is outside [0, {num_classes})"
            ),
            NnError::EmptyBatch { context } => write!(f, "{context} received an empty batch"),
            NnError::InvalidConfig { parameter, reason } => {
                write!(f, "invalid value for `{parameter}`: {reason}")
            }
        }
    }
}

impl Error for NnError {}

/// Checks that every label indexes one of `num_classes` classes.
pub(crate) fn check_labels(y: &[usize], num_classes: usize) -> Result<()> {
    match y.iter().enumerate().find(|(_, &label)| label >= num_classes) {
        Some((index, &label)) => Err(NnError::LabelOutOfRange {
            index,
            label,
            num_classes,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_labels_reports_first_offender() {
        let err = check_labels(&[0, 2, 5, 7], 4).unwrap_err();
        assert_eq!(
            err,
            NnError::LabelOutOfRange {
                index: 2,
                label: 5,
                num_classes: 4
            }
        );
    }

    #[test]
    fn test_display_mentions_context() {
        let err = NnError::ShapeMismatch {
            context: "svm_loss_naive",
            expected: vec![3],
            got: vec![4],
        };
        assert!(err.to_string().contains("svm_loss_naive"));
    }
}
