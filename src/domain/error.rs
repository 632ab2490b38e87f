// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure mode with a contract gets its own type, so
// callers can match on exactly the failure they can recover
// from and tests can assert the kind, not a message string.
//
// Propagation policy:
//   - MalformedFrameError is recovered locally: the offending
//     record or source is skipped and loading continues.
//   - EmptyCorpusError and IncompatibleSnapshotError are fatal
//     and surface to the operator before any work starts.
//   - NonFiniteLossError aborts a training run; snapshots saved
//     before the divergence stay on disk.
//
// The orchestration layers use anyhow; these types cross into
// it via `?` and stay downcastable on the way out.

use thiserror::Error;

/// A record lacks a field the configured feature mode requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("frame has no {missing}, required by the {mode} feature mode")]
pub struct MalformedFrameError {
    /// Feature mode that rejected the frame ("rays" or "checkpoints")
    pub mode: &'static str,
    /// Name of the absent field
    pub missing: &'static str,
}

/// Zero usable frames remained after reading every source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no usable telemetry frames after reading all sources")]
pub struct EmptyCorpusError;

/// A snapshot's declared feature width does not match the network
/// it claims to describe. Loading must stop here; truncating or
/// padding the input would serve garbage predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("snapshot feature width is {declared} but the recorded network takes {expected} inputs")]
pub struct IncompatibleSnapshotError {
    /// Input width of the recorded network
    pub expected: usize,
    /// Width implied by the snapshot's feature configuration
    pub declared: usize,
}

/// The training loss left the finite range (diverging optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("training loss became non-finite at epoch {epoch}, batch {batch}")]
pub struct NonFiniteLossError {
    pub epoch: usize,
    pub batch: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_snapshot_message_names_both_widths() {
        let err = IncompatibleSnapshotError { expected: 9, declared: 12 };
        let text = err.to_string();
        assert!(text.contains('9') && text.contains("12"));
    }

    #[test]
    fn errors_survive_anyhow_downcast() {
        let err: anyhow::Error = EmptyCorpusError.into();
        assert!(err.downcast_ref::<EmptyCorpusError>().is_some());
    }
}
