// ABOUTME: GitHub implementation of the provider capability traits.
// ABOUTME: REST API calls plus local git plumbing for promotion branches.

mod propose;
mod provider;

pub use provider::GitHubProvider;
