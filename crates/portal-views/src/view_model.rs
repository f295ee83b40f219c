use portal_domain::{CoreError, Identity};

/// Handle for one in-flight fetch. Redeeming it against the view model
/// proves the response still belongs to the identity and generation that
/// asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    identity: Option<Identity>,
}

impl FetchTicket {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// The response arrived after the view moved on to another identity or
    /// a newer load. It was dropped without touching the snapshot.
    DiscardedStale,
}

/// Remote snapshot plus the loading and error flags a screen renders from.
///
/// Every load bumps a generation counter and hands out a [`FetchTicket`];
/// only the response holding the current ticket may write the snapshot, so
/// a slow response for a previous identity can never overwrite newer data.
#[derive(Debug, Clone)]
pub struct EntityViewModel<T> {
    data: T,
    loading: bool,
    error: Option<String>,
    identity: Option<Identity>,
    seq: u64,
}

impl<T: Default> Default for EntityViewModel<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: None,
            identity: None,
            seq: 0,
        }
    }
}

impl<T: Default> EntityViewModel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Starts a load scoped to `identity`. With no identity there is nothing
    /// to fetch: the snapshot resets to empty, no ticket is issued, and any
    /// response still in flight is orphaned by the generation bump.
    ///
    /// Switching identities clears the snapshot up front so the previous
    /// user's rows are never shown under the new one.
    pub fn begin_load(&mut self, identity: Option<&Identity>) -> Option<FetchTicket> {
        self.seq += 1;
        let identity = identity.filter(|id| !id.as_str().is_empty());

        let Some(identity) = identity else {
            self.data = T::default();
            self.loading = false;
            self.error = None;
            self.identity = None;
            return None;
        };

        if self.identity.as_ref() != Some(identity) {
            self.data = T::default();
        }
        self.identity = Some(identity.clone());
        self.loading = true;
        self.error = None;
        Some(FetchTicket {
            seq: self.seq,
            identity: Some(identity.clone()),
        })
    }

    /// Starts a load that is not scoped to an identity (shared catalogs,
    /// the admin directory). Always issues a ticket.
    pub fn begin_catalog_load(&mut self) -> FetchTicket {
        self.seq += 1;
        self.identity = None;
        self.loading = true;
        self.error = None;
        FetchTicket {
            seq: self.seq,
            identity: None,
        }
    }

    /// Re-fetches the current scope. The stale snapshot stays visible while
    /// the refresh is in flight.
    pub fn begin_refresh(&mut self) -> Option<FetchTicket> {
        self.seq += 1;
        self.loading = true;
        self.error = None;
        Some(FetchTicket {
            seq: self.seq,
            identity: self.identity.clone(),
        })
    }

    /// Applies a finished fetch. Responses whose ticket no longer matches
    /// the current generation and identity are discarded unseen. A failed
    /// fetch keeps the previous snapshot and records the error.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<T, CoreError>) -> LoadOutcome {
        if ticket.seq != self.seq || ticket.identity != self.identity {
            tracing::debug!(
                ticket_seq = ticket.seq,
                current_seq = self.seq,
                "stale fetch response discarded"
            );
            return LoadOutcome::DiscardedStale;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
            }
            Err(error) => {
                tracing::warn!(%error, "fetch failed, keeping previous snapshot");
                self.error = Some(error.to_string());
            }
        }
        LoadOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> Identity {
        Identity::from(email)
    }

    #[test]
    fn load_applies_the_response_for_the_issuing_identity() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket issued");
        assert!(view.is_loading());

        let outcome = view.complete(ticket, Ok(vec!["row".to_owned()]));
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(!view.is_loading());
        assert_eq!(view.data(), &vec!["row".to_owned()]);
    }

    #[test]
    fn response_for_a_previous_identity_is_discarded() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket_a = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket for a");
        let ticket_b = view
            .begin_load(Some(&identity("b@x.com")))
            .expect("ticket for b");

        // A's slow response lands after the switch to B.
        let outcome = view.complete(ticket_a, Ok(vec!["a-row".to_owned()]));
        assert_eq!(outcome, LoadOutcome::DiscardedStale);
        assert!(view.data().is_empty());
        assert!(view.is_loading());

        let outcome = view.complete(ticket_b, Ok(vec!["b-row".to_owned()]));
        assert_eq!(outcome, LoadOutcome::Applied);
        assert_eq!(view.data(), &vec!["b-row".to_owned()]);
    }

    #[test]
    fn switching_identity_clears_the_snapshot_before_the_new_fetch_lands() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket for a");
        view.complete(ticket, Ok(vec!["a-row".to_owned()]));

        view.begin_load(Some(&identity("b@x.com")));
        assert!(
            view.data().is_empty(),
            "previous identity rows must not flash under the new identity"
        );
    }

    #[test]
    fn missing_identity_resets_without_issuing_a_ticket() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket for a");
        view.complete(ticket, Ok(vec!["a-row".to_owned()]));

        assert!(view.begin_load(None).is_none());
        assert!(view.data().is_empty());
        assert!(!view.is_loading());
        assert!(view.error().is_none());
    }

    #[test]
    fn blank_identity_counts_as_missing() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        assert!(view.begin_load(Some(&identity("   "))).is_none());
    }

    #[test]
    fn failed_refresh_keeps_the_stale_snapshot_visible() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket for a");
        view.complete(ticket, Ok(vec!["a-row".to_owned()]));

        let refresh = view.begin_refresh().expect("refresh ticket");
        assert_eq!(
            view.data(),
            &vec!["a-row".to_owned()],
            "snapshot stays visible during refresh"
        );

        view.complete(
            refresh,
            Err(CoreError::DependencyUnavailable("offline".to_owned())),
        );
        assert_eq!(view.data(), &vec!["a-row".to_owned()]);
        assert!(view.error().is_some());
        assert!(!view.is_loading());
    }

    #[test]
    fn superseded_refresh_response_is_discarded() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view
            .begin_load(Some(&identity("a@x.com")))
            .expect("ticket for a");
        view.complete(ticket, Ok(vec!["old".to_owned()]));

        let slow = view.begin_refresh().expect("first refresh");
        let fast = view.begin_refresh().expect("second refresh");
        view.complete(fast, Ok(vec!["new".to_owned()]));

        let outcome = view.complete(slow, Ok(vec!["older".to_owned()]));
        assert_eq!(outcome, LoadOutcome::DiscardedStale);
        assert_eq!(view.data(), &vec!["new".to_owned()]);
    }

    #[test]
    fn catalog_load_needs_no_identity() {
        let mut view = EntityViewModel::<Vec<String>>::new();
        let ticket = view.begin_catalog_load();
        assert!(view.is_loading());
        view.complete(ticket, Ok(vec!["plan".to_owned()]));
        assert_eq!(view.data(), &vec!["plan".to_owned()]);
    }
}
