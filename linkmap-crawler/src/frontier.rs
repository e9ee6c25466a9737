use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::normalize::Domain;

/// Result of asking the frontier for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A domain to fetch. The claim stays outstanding until the worker
    /// calls `complete()`.
    Job(Domain),
    /// Nothing queued right now, but claims are still in flight and may
    /// discover more. Idle briefly and ask again.
    Pending,
    /// Queue empty and nothing in flight: the crawl is over.
    Drained,
}

#[derive(Debug, Default)]
struct FrontierState {
    pending: VecDeque<Domain>,
    visited: HashSet<Domain>,
    in_flight: usize,
}

/// The crawl's work queue plus visited-set guard.
///
/// One mutex guards pending, visited, and the in-flight count together,
/// so check-and-insert and pop-and-claim are each a single atomic step.
/// Constructed fresh per crawl and handed to every worker; there is no
/// process-wide frontier.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    max_domains: Option<usize>,
}

impl Frontier {
    /// Seeds are preloaded as both visited and pending.
    pub fn new(seeds: impl IntoIterator<Item = Domain>, max_domains: Option<usize>) -> Self {
        let mut state = FrontierState::default();
        for seed in seeds {
            if state.visited.insert(seed.clone()) {
                state.pending.push_back(seed);
            }
        }
        Self {
            state: Mutex::new(state),
            max_domains,
        }
    }

    /// Schedule a domain unless it was ever scheduled before. Returns
    /// true when the domain is newly queued.
    ///
    /// The membership check and the queue insert happen under one lock:
    /// two workers racing on the same discovery produce exactly one
    /// job.
    pub fn enqueue_if_new(&self, domain: Domain) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.visited.contains(&domain) {
            return false;
        }
        if let Some(cap) = self.max_domains
            && state.visited.len() >= cap
        {
            return false;
        }
        state.visited.insert(domain.clone());
        state.pending.push_back(domain);
        true
    }

    /// Pop the next pending domain. `Drained` requires the queue to be
    /// empty AND no claim outstanding; a worker that is still mid-fetch
    /// may yet enqueue discoveries, so queue emptiness alone never ends
    /// the crawl.
    pub fn claim_next(&self) -> Claim {
        let mut state = self.state.lock().unwrap();
        match state.pending.pop_front() {
            Some(domain) => {
                state.in_flight += 1;
                Claim::Job(domain)
            }
            None if state.in_flight == 0 => Claim::Drained,
            None => Claim::Pending,
        }
    }

    /// Release a claim taken via `claim_next`.
    pub fn complete(&self) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(state.in_flight > 0, "complete() without a claim");
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    pub fn visited_count(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}
