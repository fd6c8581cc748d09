//! Administrative command surface for the region warden.
//!
//! Commands arrive as whitespace-separated words. Each produces a
//! [`CommandOutcome`] whose status follows the host convention: 1 for
//! success, 0 for failure.

use tracing::{error, info};

use fw_core::{
    AdminConfig, ConfigStore, CoreError, EntityId, RegionCenter, RegionMode, load_config,
    save_config,
};

use crate::clock::Tick;
use crate::context::TickContext;
use crate::event::RuntimeEventKind;
use crate::region::RegionWarden;

/// A parsed administrative command.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    /// Show the current configuration.
    Status,
    /// Turn presence tracking on.
    Enable,
    /// Turn presence tracking off.
    Disable,
    /// Flip presence tracking.
    Toggle,
    /// Move the region center to the acting player.
    SetCenter,
    /// Set the region half-width.
    SetRadius(u32),
    /// Set the restricted mode.
    SetMode(RegionMode),
    /// Set the per-player toggle cooldown.
    SetCooldown(Tick),
    /// Set the per-player check interval.
    SetInterval(Tick),
    /// Exempt a player name.
    WhitelistAdd(String),
    /// Remove an exemption.
    WhitelistRemove(String),
    /// List exempt names.
    WhitelistList,
    /// Re-read the stored config.
    Reload,
    /// List commands.
    Help,
}

/// Why a command was rejected.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// First word is not a command.
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    /// Wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Argument is not an integer.
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    /// Argument below zero.
    #[error("{name} must be >= 0, got {value}")]
    Negative {
        /// Argument name.
        name: &'static str,
        /// Value given.
        value: i64,
    },

    /// Argument out of range or otherwise invalid.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// `set-center` without an actor position.
    #[error("set-center needs a player with a known position")]
    NoPosition,

    /// Nothing to do.
    #[error("{0}")]
    Rejected(String),

    /// The change was applied but could not be persisted.
    #[error("change applied but not saved: {0}")]
    NotSaved(CoreError),

    /// The config store could not be read.
    #[error("could not read stored config: {0}")]
    LoadFailed(CoreError),
}

/// Result of one command, in the host's reporting convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// [`CommandOutcome::SUCCESS`] or [`CommandOutcome::FAILURE`].
    pub status: i32,
    /// Text for the issuing actor.
    pub lines: Vec<String>,
}

impl CommandOutcome {
    /// Status of a successful command.
    pub const SUCCESS: i32 = 1;
    /// Status of a failed command.
    pub const FAILURE: i32 = 0;

    /// A successful outcome.
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            status: Self::SUCCESS,
            lines,
        }
    }

    /// A failed outcome with one line.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Self::FAILURE,
            lines: vec![message.into()],
        }
    }

    /// Whether the command succeeded.
    pub fn is_success(&self) -> bool {
        self.status == Self::SUCCESS
    }
}

impl From<Result<Vec<String>, AdminError>> for CommandOutcome {
    fn from(result: Result<Vec<String>, AdminError>) -> Self {
        match result {
            Ok(lines) => Self::success(lines),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}

/// Command reference shown by `help`.
pub const HELP: &[(&str, &str)] = &[
    ("status", "show the current region configuration"),
    ("enable", "turn presence tracking on"),
    ("disable", "turn presence tracking off and release players"),
    ("toggle", "flip presence tracking"),
    ("set-center", "center the region on your position"),
    ("set-radius <1-8192>", "set the region half-width in blocks"),
    ("set-mode <adventure|spectator>", "set the mode applied inside"),
    ("set-cooldown <ticks>", "minimum ticks between toggles per player"),
    ("set-interval <ticks>", "ticks between presence checks per player"),
    ("whitelist add <name>", "exempt a player"),
    ("whitelist remove <name>", "remove an exemption"),
    ("whitelist list", "list exempt players"),
    ("reload", "re-read the stored configuration"),
    ("help", "show this list"),
];

impl AdminCommand {
    /// Parse one command line. Empty input is `help`.
    pub fn parse(input: &str) -> Result<Self, AdminError> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((first, args)) = words.split_first() else {
            return Ok(Self::Help);
        };

        let cmd = match first.to_lowercase().as_str() {
            "status" => no_args(args, "status", Self::Status)?,
            "enable" | "on" => no_args(args, "enable", Self::Enable)?,
            "disable" | "off" => no_args(args, "disable", Self::Disable)?,
            "toggle" => no_args(args, "toggle", Self::Toggle)?,
            "set-center" | "setcenter" => no_args(args, "set-center", Self::SetCenter)?,
            "set-radius" | "setradius" => {
                let value = one_int(args, "set-radius <1-8192>")?;
                Self::SetRadius(AdminConfig::check_radius(value)?)
            }
            "set-mode" | "setmode" => match args {
                [mode] => Self::SetMode(mode.parse()?),
                _ => return Err(AdminError::Usage("set-mode <adventure|spectator>")),
            },
            "set-cooldown" | "setcooldown" => {
                let value = one_int(args, "set-cooldown <ticks>")?;
                Self::SetCooldown(non_negative("cooldown", value)?)
            }
            "set-interval" | "setinterval" => {
                let value = one_int(args, "set-interval <ticks>")?;
                Self::SetInterval(non_negative("interval", value)?)
            }
            "whitelist" => match args {
                [action, name] if action.eq_ignore_ascii_case("add") => {
                    Self::WhitelistAdd((*name).to_string())
                }
                [action, name] if action.eq_ignore_ascii_case("remove") => {
                    Self::WhitelistRemove((*name).to_string())
                }
                [action] if action.eq_ignore_ascii_case("list") => Self::WhitelistList,
                _ => return Err(AdminError::Usage("whitelist <add|remove> <name> | whitelist list")),
            },
            "reload" => no_args(args, "reload", Self::Reload)?,
            "help" | "?" => Self::Help,
            other => return Err(AdminError::UnknownCommand(other.to_string())),
        };
        Ok(cmd)
    }

    /// Whether the command changes the config.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Status | Self::WhitelistList | Self::Help)
    }
}

fn no_args(args: &[&str], usage: &'static str, cmd: AdminCommand) -> Result<AdminCommand, AdminError> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(AdminError::Usage(usage))
    }
}

fn one_int(args: &[&str], usage: &'static str) -> Result<i64, AdminError> {
    match args {
        [value] => value
            .parse()
            .map_err(|_| AdminError::NotANumber((*value).to_string())),
        _ => Err(AdminError::Usage(usage)),
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<Tick, AdminError> {
    Tick::try_from(value).map_err(|_| AdminError::Negative { name, value })
}

/// Lines printed by `help`.
pub fn help_lines() -> Vec<String> {
    let width = HELP.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    HELP.iter()
        .map(|(usage, what)| format!("{usage:<width$}  {what}"))
        .collect()
}

/// Lines printed by `status`.
pub fn status_lines(warden: &RegionWarden) -> Vec<String> {
    let config = warden.config();
    let (min_x, max_x) = warden.bounds().x_range();
    let (min_z, max_z) = warden.bounds().z_range();
    vec![
        format!(
            "Region warden: {}",
            if config.enabled { "enabled" } else { "disabled" }
        ),
        format!("Center: ({}, {})", config.center.x, config.center.z),
        format!(
            "Radius: {} (x {min_x}..{max_x}, z {min_z}..{max_z})",
            config.radius
        ),
        format!("Mode: {}", config.mode),
        format!("Cooldown: {} ticks", config.cooldown_ticks),
        format!("Check interval: {} ticks", config.check_interval_ticks),
        format!("Whitelist: {} player(s)", config.whitelist.len()),
        format!("Players inside: {}", warden.presence().inside_players().len()),
    ]
}

/// Run a parsed command against the warden and persist any change.
pub(crate) fn execute(
    cmd: AdminCommand,
    warden: &mut RegionWarden,
    store: &mut dyn ConfigStore,
    ctx: &mut TickContext<'_>,
    actor: Option<EntityId>,
) -> Result<Vec<String>, AdminError> {
    let message = match cmd {
        AdminCommand::Status => return Ok(status_lines(warden)),
        AdminCommand::Help => return Ok(help_lines()),
        AdminCommand::WhitelistList => {
            let names = &warden.config().whitelist;
            if names.is_empty() {
                return Ok(vec!["Whitelist is empty".to_string()]);
            }
            return Ok(vec![format!("Whitelist: {}", names.join(", "))]);
        }
        AdminCommand::Reload => return reload(warden, &*store, ctx),
        AdminCommand::Enable => set_enabled(warden, ctx, true)?,
        AdminCommand::Disable => set_enabled(warden, ctx, false)?,
        AdminCommand::Toggle => {
            let enabled = !warden.config().enabled;
            set_enabled(warden, ctx, enabled)?
        }
        AdminCommand::SetCenter => {
            let position = actor
                .and_then(|a| ctx.world.position(a))
                .filter(|p| p.is_finite())
                .ok_or(AdminError::NoPosition)?;
            warden.set_center(RegionCenter::new(position.x, position.z));
            format!("Center set to ({}, {})", position.x, position.z)
        }
        AdminCommand::SetRadius(radius) => {
            warden.set_radius(radius);
            format!("Radius set to {radius}")
        }
        AdminCommand::SetMode(mode) => {
            warden.set_mode(ctx, mode);
            format!("Mode set to {mode}")
        }
        AdminCommand::SetCooldown(ticks) => {
            warden.set_cooldown(ticks);
            format!("Cooldown set to {ticks} ticks")
        }
        AdminCommand::SetInterval(ticks) => {
            warden.set_check_interval(ticks);
            format!("Check interval set to {ticks} ticks")
        }
        AdminCommand::WhitelistAdd(name) => {
            if !warden.whitelist_add(&name) {
                return Err(AdminError::Rejected(format!("{name} is already whitelisted")));
            }
            format!("{name} added to the whitelist")
        }
        AdminCommand::WhitelistRemove(name) => {
            if !warden.whitelist_remove(&name) {
                return Err(AdminError::Rejected(format!("{name} is not whitelisted")));
            }
            format!("{name} removed from the whitelist")
        }
    };

    info!(change = %message, "admin config changed");
    ctx.emit(
        RuntimeEventKind::ConfigChanged {
            setting: message.clone(),
        },
        message.clone(),
    );
    if let Err(err) = save_config(store, warden.config()) {
        error!(error = %err, "failed to persist admin config");
        return Err(AdminError::NotSaved(err));
    }
    Ok(vec![message])
}

fn set_enabled(
    warden: &mut RegionWarden,
    ctx: &mut TickContext<'_>,
    enabled: bool,
) -> Result<String, AdminError> {
    let word = if enabled { "enabled" } else { "disabled" };
    if !warden.set_enabled(ctx, enabled) {
        return Err(AdminError::Rejected(format!("Region warden already {word}")));
    }
    Ok(format!("Region warden {word}"))
}

fn reload(
    warden: &mut RegionWarden,
    store: &dyn ConfigStore,
    ctx: &mut TickContext<'_>,
) -> Result<Vec<String>, AdminError> {
    match load_config(store).map_err(AdminError::LoadFailed)? {
        Some(config) => {
            warden.replace_config(ctx, config);
            ctx.emit(
                RuntimeEventKind::ConfigChanged {
                    setting: "reloaded".to_string(),
                },
                "config reloaded from store",
            );
            Ok(vec!["Configuration reloaded".to_string()])
        }
        None => Ok(vec![
            "No stored configuration, keeping current settings".to_string(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use crate::scheduler::Scheduler;
    use crate::task::Task;
    use fw_core::{MemoryEntity, MemoryStore, MemoryWorld, Vec3};

    #[test]
    fn parse_basic_commands() {
        assert_eq!(AdminCommand::parse("status").unwrap(), AdminCommand::Status);
        assert_eq!(AdminCommand::parse("  ").unwrap(), AdminCommand::Help);
        assert_eq!(AdminCommand::parse("TOGGLE").unwrap(), AdminCommand::Toggle);
        assert_eq!(
            AdminCommand::parse("set-radius 128").unwrap(),
            AdminCommand::SetRadius(128)
        );
        assert_eq!(
            AdminCommand::parse("set-mode spectator").unwrap(),
            AdminCommand::SetMode(RegionMode::Spectator)
        );
        assert_eq!(
            AdminCommand::parse("whitelist add Steve").unwrap(),
            AdminCommand::WhitelistAdd("Steve".into())
        );
        assert_eq!(
            AdminCommand::parse("whitelist list").unwrap(),
            AdminCommand::WhitelistList
        );
        assert_eq!(
            AdminCommand::parse("set-interval 0").unwrap(),
            AdminCommand::SetInterval(0)
        );
    }

    #[test]
    fn parse_rejects_bad_arguments() {
        assert!(matches!(
            AdminCommand::parse("set-radius 0"),
            Err(AdminError::Invalid(_))
        ));
        assert!(matches!(
            AdminCommand::parse("set-radius 8193"),
            Err(AdminError::Invalid(_))
        ));
        assert!(matches!(
            AdminCommand::parse("set-radius big"),
            Err(AdminError::NotANumber(_))
        ));
        assert!(matches!(
            AdminCommand::parse("set-cooldown -1"),
            Err(AdminError::Negative { value: -1, .. })
        ));
        assert!(matches!(
            AdminCommand::parse("set-mode creative"),
            Err(AdminError::Invalid(_))
        ));
        assert!(matches!(
            AdminCommand::parse("status now"),
            Err(AdminError::Usage(_))
        ));
        assert!(matches!(
            AdminCommand::parse("whitelist add"),
            Err(AdminError::Usage(_))
        ));
        assert!(matches!(
            AdminCommand::parse("explode"),
            Err(AdminError::UnknownCommand(_))
        ));
    }

    #[test]
    fn mutation_flag() {
        assert!(AdminCommand::SetRadius(4).is_mutation());
        assert!(AdminCommand::Reload.is_mutation());
        assert!(!AdminCommand::Status.is_mutation());
    }

    #[test]
    fn outcome_statuses() {
        let ok = CommandOutcome::from(Ok(vec!["done".to_string()]));
        assert_eq!(ok.status, 1);
        let err = CommandOutcome::from(Err(AdminError::NoPosition));
        assert_eq!(err.status, 0);
        assert!(!err.is_success());
        assert!(err.lines[0].contains("set-center"));
    }

    #[test]
    fn help_lists_every_command() {
        let lines = help_lines();
        assert_eq!(lines.len(), HELP.len());
        assert!(lines.iter().any(|l| l.starts_with("whitelist add")));
    }

    struct Rig {
        world: MemoryWorld,
        sched: Scheduler<Task>,
        events: EventLog,
        warden: RegionWarden,
        store: MemoryStore,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                world: MemoryWorld::new(),
                sched: Scheduler::new(),
                events: EventLog::new(0),
                warden: RegionWarden::new(AdminConfig::default()),
                store: MemoryStore::new(),
            }
        }

        fn run(&mut self, input: &str, actor: Option<EntityId>) -> CommandOutcome {
            let mut ctx = TickContext {
                world: &mut self.world,
                scheduler: &mut self.sched,
                events: &mut self.events,
            };
            let result = AdminCommand::parse(input)
                .and_then(|cmd| execute(cmd, &mut self.warden, &mut self.store, &mut ctx, actor));
            CommandOutcome::from(result)
        }
    }

    #[test]
    fn mutation_is_persisted() {
        let mut rig = Rig::new();
        let out = rig.run("set-radius 32", None);
        assert!(out.is_success());
        let stored = AdminConfig::from_json(rig.store.blob().unwrap()).unwrap();
        assert_eq!(stored.radius, 32);
        assert_eq!(rig.events.len(), 1);
    }

    #[test]
    fn set_center_uses_actor_position() {
        let mut rig = Rig::new();
        let admin = rig
            .world
            .add_entity(MemoryEntity::at("Op", Vec3::new(12.5, 70.0, -3.0)))
            .unwrap();
        assert!(rig.run("set-center", Some(admin)).is_success());
        assert_eq!(rig.warden.config().center, RegionCenter::new(12.5, -3.0));

        let console = rig.run("set-center", None);
        assert_eq!(console.status, CommandOutcome::FAILURE);
    }

    #[test]
    fn redundant_changes_fail_without_saving() {
        let mut rig = Rig::new();
        assert_eq!(rig.run("enable", None).status, 0);
        assert!(rig.store.blob().is_none());
        assert!(rig.run("whitelist add Steve", None).is_success());
        assert_eq!(rig.run("whitelist add steve", None).status, 0);
        assert_eq!(rig.run("whitelist remove Alex", None).status, 0);
        let listed = rig.run("whitelist list", None);
        assert_eq!(listed.lines, vec!["Whitelist: Steve".to_string()]);
    }

    #[test]
    fn toggle_flips_enabled() {
        let mut rig = Rig::new();
        assert!(rig.run("toggle", None).is_success());
        assert!(!rig.warden.config().enabled);
        assert!(rig.run("toggle", None).is_success());
        assert!(rig.warden.config().enabled);
    }

    #[test]
    fn reload_reads_store_or_keeps_current() {
        let mut rig = Rig::new();
        let out = rig.run("reload", None);
        assert!(out.is_success());
        assert!(out.lines[0].contains("keeping current"));

        let stored = AdminConfig {
            radius: 300,
            ..AdminConfig::default()
        };
        rig.store = MemoryStore::with_blob(stored.to_json().unwrap());
        assert!(rig.run("reload", None).is_success());
        assert_eq!(rig.warden.config().radius, 300);

        rig.store = MemoryStore::with_blob("{ not json");
        let out = rig.run("reload", None);
        assert_eq!(out.status, 0);
        assert_eq!(rig.warden.config().radius, 300);
    }

    #[test]
    fn status_reports_settings() {
        let mut rig = Rig::new();
        let out = rig.run("status", None);
        assert!(out.is_success());
        assert!(out.lines.contains(&"Region warden: enabled".to_string()));
        assert!(out.lines.contains(&"Mode: adventure".to_string()));
        assert!(out.lines.iter().any(|l| l.starts_with("Radius: 64")));
    }
}
