//! # Axon Network
//!
//! The matching and firing core of the Axon knowledge store.
//!
//! ## Architecture
//!
//! ```text
//! Network            ← fact ingestion, rule compilation, fixpoint loop
//!     │
//! Node               ← discrimination tree: one feature test per node,
//!     │                prefixes shared across premises and rules
//! PremNode           ← per-premise terminal: every binding ever observed
//!     │
//! Rule               ← premises, varnames, conditions, consequences
//!     │
//! Binding/Activation ← premise-local and rule-global variable assignments
//! ```
//!
//! A fact entering the network is decomposed (by `axon-facts`) into an
//! ordered list of feature paths and dispatched through the tree,
//! accumulating a [`Binding`] on the way down. Each premise terminal it
//! reaches stores the binding forever and joins it against the stored
//! matches of the owning rules' other premises; every complete, consistent
//! join is an activation. Firing an activation evaluates the rule's
//! conditions and asserts its consequences, which re-enter the same loop
//! until no rule has anything left to derive.
//!
//! Single-threaded by design: all mutation is behind `&mut Network`, and
//! the recursive ingestion implied by firing is flattened into a FIFO work
//! queue.

pub mod binding;
pub mod error;
pub mod network;
pub mod node;
pub mod premise;
pub mod rule;

pub use binding::{Activation, Binding, VarId};
pub use error::NetworkError;
pub use network::{ConditionFn, Network, NetworkConfig, NetworkStats};
pub use node::{Node, NodeId, NodeTest};
pub use premise::{PremId, PremNode};
pub use rule::{ConditionSpec, Rule, RuleId, Varname};
