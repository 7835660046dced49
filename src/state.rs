//! Implements a struct that holds the state of the REST server.

use std::{
    marker::{Send, Sync},
    sync::Arc,
};

use axum::extract::FromRef;

use crate::{
    auth::{AuthState, SessionVerifier},
    ledger::LedgerService,
    stores::{AccountStore, CategoryStore, TransactionStore},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState<A, C, T>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    /// The ledger service that validates and applies all mutations.
    pub ledger: LedgerService<A, C, T>,
    /// The session backend that resolves bearer tokens to user ids.
    pub verifier: Arc<dyn SessionVerifier + Send + Sync>,
}

impl<A, C, T> AppState<A, C, T>
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(
        ledger: LedgerService<A, C, T>,
        verifier: Arc<dyn SessionVerifier + Send + Sync>,
    ) -> Self {
        Self { ledger, verifier }
    }
}

impl<A, C, T> FromRef<AppState<A, C, T>> for AuthState
where
    A: AccountStore + Clone + Send + Sync,
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
{
    fn from_ref(state: &AppState<A, C, T>) -> Self {
        Self {
            verifier: state.verifier.clone(),
        }
    }
}
