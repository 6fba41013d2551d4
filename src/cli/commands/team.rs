//! Team command - roster management

use clap::{Args, Subcommand};
use console::style;
use dialoguer::Confirm;
use miette::{bail, miette, IntoDiagnostic, Result};

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{resolve_actor, truncate_str};
use crate::core::team::{Role, TeamMember, TeamRoster};
use crate::core::{Action, Config, Project};

/// Team roster management
#[derive(Debug, Subcommand)]
pub enum TeamCommands {
    /// List team members
    List(TeamListArgs),
    /// Show who the tracker will act as, and what they may do
    Whoami,
    /// Add a team member
    Add(TeamAddArgs),
    /// Remove a team member
    Remove(TeamRemoveArgs),
}

/// List team members
#[derive(Debug, Args)]
pub struct TeamListArgs {
    /// Filter by role
    #[arg(long, short = 'r')]
    pub role: Option<Role>,
}

/// Add a team member
#[derive(Debug, Args)]
pub struct TeamAddArgs {
    /// Member's full name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: Option<String>,

    /// Username used as the acting identity
    #[arg(long)]
    pub username: String,

    /// Roles (comma-separated: operator,inspector,calibration,quality,admin)
    #[arg(long, value_delimiter = ',', required = true)]
    pub roles: Vec<Role>,
}

/// Remove a team member
#[derive(Debug, Args)]
pub struct TeamRemoveArgs {
    /// Username to remove
    pub username: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl TeamCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        match self {
            TeamCommands::List(args) => args.run(global),
            TeamCommands::Whoami => run_whoami(global),
            TeamCommands::Add(args) => args.run(global),
            TeamCommands::Remove(args) => args.run(global),
        }
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl TeamListArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;

        let Some(roster) = TeamRoster::load(&project) else {
            bail!("No team roster found. Add a member with 'gtt team add' to create one.");
        };

        let members: Vec<&TeamMember> = match self.role {
            Some(role) => roster.members_with_role(role).collect(),
            None => roster.active_members().collect(),
        };

        if members.is_empty() {
            println!("No team members found.");
            return Ok(());
        }

        match global.output {
            crate::cli::OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&members).into_diagnostic()?;
                println!("{}", json);
            }
            _ => {
                println!("{:<20} {:<25} {:<15} ROLES", "NAME", "EMAIL", "USERNAME");
                println!("{}", "-".repeat(75));
                for member in members {
                    println!(
                        "{:<20} {:<25} {:<15} {}",
                        truncate_str(&member.name, 18),
                        truncate_str(member.email.as_deref().unwrap_or("-"), 23),
                        truncate_str(&member.username, 13),
                        join_roles(&member.roles)
                    );
                }
            }
        }
        Ok(())
    }
}

fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let project = Project::discover().into_diagnostic()?;
    let config = Config::load(&project).into_diagnostic()?;
    let actor = resolve_actor(&config, global);

    println!("Acting as: {}", style(&actor).cyan());
    let Some(roster) = TeamRoster::load(&project) else {
        println!("No team roster; every action is allowed.");
        return Ok(());
    };
    let Some(member) = roster.find(&actor) else {
        bail!(
            "{} is not in the team roster.\n\
             Add them with: gtt team add --name \"...\" --username {} --roles operator",
            actor,
            actor
        );
    };

    println!("Name:      {}", member.name);
    println!("Roles:     {}", join_roles(&member.roles));
    let allowed: Vec<String> = Action::all()
        .iter()
        .filter(|a| roster.can(&actor, **a))
        .map(|a| a.to_string())
        .collect();
    println!("May:       {}", allowed.join(", "));
    Ok(())
}

impl TeamAddArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;
        let mut roster = TeamRoster::load(&project).unwrap_or_default();

        let member = TeamMember {
            name: self.name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            roles: self.roles.clone(),
            active: true,
        };
        roster.add_member(member).map_err(|e| {
            miette!(
                "{}\nUse 'gtt team remove {}' first to update.",
                e,
                self.username
            )
        })?;
        roster.save(&project).into_diagnostic()?;

        println!(
            "{} Added {} ({}) to team roster",
            style("✓").green(),
            self.name,
            self.username
        );
        println!("Roles: {}", join_roles(&self.roles));
        Ok(())
    }
}

impl TeamRemoveArgs {
    pub fn run(&self, _global: &GlobalOpts) -> Result<()> {
        let project = Project::discover().into_diagnostic()?;
        let mut roster =
            TeamRoster::load(&project).ok_or_else(|| miette!("No team roster found."))?;

        let name = roster
            .find(&self.username)
            .map(|m| m.name.clone())
            .ok_or_else(|| miette!("User '{}' not found in team roster.", self.username))?;

        if !self.yes {
            let confirmed = Confirm::new()
                .with_prompt(format!("Remove {} ({}) from team roster?", name, self.username))
                .default(false)
                .interact()
                .into_diagnostic()?;
            if !confirmed {
                println!("Aborted.");
                return Ok(());
            }
        }

        if !roster.remove_member(&self.username) {
            bail!("Failed to remove user.");
        }
        roster.save(&project).into_diagnostic()?;
        println!("Removed {} ({}) from team roster", name, self.username);
        Ok(())
    }
}
