//! Agent subsystem: loop, context, memory, skills, agent definitions, sandbox.

pub mod agents;
pub mod context;
pub mod helpers;
pub mod loop_core;
pub mod memory;
pub mod sandbox;
pub mod skill_watcher;
pub mod skill_autogen;
pub mod skills;
pub mod skills_v2;
