//! Team roster - who may do what in the gauge crib
//!
//! The roster lives in `.gtt/team.yaml`. When no roster exists every action is
//! allowed, so a single-user installation works without configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::auth::Action;
use crate::core::project::Project;

const TEAM_FILE: &str = "team.yaml";

/// Roles a team member can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Checks gauges in and out on the shop floor
    Operator,
    /// Performs incoming and post-use QC
    Inspector,
    /// Runs the calibration program
    Calibration,
    /// Quality engineering - owns sets and retirement
    Quality,
    /// Everything
    Admin,
}

impl Role {
    /// Whether this role grants `action`
    pub fn permits(&self, action: Action) -> bool {
        match self {
            Role::Admin => true,
            Role::Quality => !matches!(action, Action::Calibrate),
            Role::Calibration => matches!(
                action,
                Action::ChangeStatus | Action::Calibrate | Action::Certify
            ),
            Role::Inspector => matches!(action, Action::ChangeStatus | Action::Intake),
            Role::Operator => matches!(action, Action::ChangeStatus),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Operator => write!(f, "operator"),
            Role::Inspector => write!(f, "inspector"),
            Role::Calibration => write!(f, "calibration"),
            Role::Quality => write!(f, "quality"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A member of the team roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Username used as the actor identity
    pub username: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TeamMember {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// The team roster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl TeamRoster {
    /// Load the roster from a project, if one exists and parses
    pub fn load(project: &Project) -> Option<Self> {
        Self::load_from(&project.gtt_dir().join(TEAM_FILE))
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_yml::from_str(&content).ok()
    }

    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let content = serde_yml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(project.gtt_dir().join(TEAM_FILE), content)
    }

    pub fn find(&self, username: &str) -> Option<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.active && m.username.eq_ignore_ascii_case(username))
    }

    pub fn active_members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.active)
    }

    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &TeamMember> {
        self.active_members().filter(move |m| m.has_role(role))
    }

    /// Add a member; fails if the username is already taken
    pub fn add_member(&mut self, member: TeamMember) -> Result<(), String> {
        if self
            .members
            .iter()
            .any(|m| m.username.eq_ignore_ascii_case(&member.username))
        {
            return Err(format!("user '{}' already exists", member.username));
        }
        self.members.push(member);
        Ok(())
    }

    /// Remove a member by username, returning whether one was removed
    pub fn remove_member(&mut self, username: &str) -> bool {
        let before = self.members.len();
        self.members
            .retain(|m| !m.username.eq_ignore_ascii_case(username));
        self.members.len() != before
    }

    /// Whether `username` holds a role granting `action`
    pub fn can(&self, username: &str, action: Action) -> bool {
        self.find(username)
            .is_some_and(|m| m.roles.iter().any(|r| r.permits(action)))
    }
}
