//! Selection of the first reachable endpoint among ordered candidates.

use std::{fmt::Display, future::Future};

use tracing::{info, warn};

use crate::error::DumpError;

/// Returns the first candidate, in order, for which `probe` succeeds.
///
/// # Errors
/// Returns [`DumpError::NoReachableEndpoint`] if there are no candidates or every probe fails.
pub async fn select_endpoint<T, F, Fut, E>(candidates: &[T], mut probe: F) -> Result<T, DumpError>
where
    T: Clone + Display,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    for candidate in candidates {
        match probe(candidate.clone()).await {
            Ok(()) => {
                info!(endpoint = %candidate, "selected endpoint");
                return Ok(candidate.clone());
            }
            Err(err) => warn!(endpoint = %candidate, %err, "endpoint unreachable"),
        }
    }

    Err(DumpError::NoReachableEndpoint(
        candidates.iter().map(ToString::to_string).collect(),
    ))
}
