use crate::config::install::{InstallConfig, UPDATER_SECTION_NAME};
use regex::Regex;

fn section_regex(name: &str) -> Regex {
    let pattern = format!(
        r"(?m)^[ \t]*\[update_manager[a-z ]* {}\]",
        regex::escape(name)
    );
    Regex::new(&pattern).expect("escaped section name always forms a valid regex")
}

/// Number of `[update_manager ... <name>]` headers in a Moonraker config.
pub fn count_updater_sections(content: &str, name: &str) -> usize {
    section_regex(name).find_iter(content).count()
}

/// The block appended to `moonraker.conf` so Moonraker's update manager
/// tracks the module repository.
pub fn render_updater_block(config: &InstallConfig) -> String {
    let paths = &config.paths;
    let managed_service = config.target_service.trim_end_matches(".service");

    format!(
        "\n## Klippain Shake&Tune automatic update management\n\
         [update_manager {name}]\n\
         type: git_repo\n\
         origin: {origin}\n\
         path: {path}\n\
         virtualenv: {venv}\n\
         requirements: requirements.txt\n\
         system_dependencies: system-dependencies.json\n\
         primary_branch: {branch}\n\
         managed_services: {service}\n",
        name = UPDATER_SECTION_NAME,
        origin = config.repository_url,
        path = paths.display_with_tilde(&paths.repository),
        venv = paths.display_with_tilde(&paths.venv),
        branch = config.branch,
        service = managed_service,
    )
}

/// Text to append to `existing` so it gains exactly one updater section, or
/// `None` when the section is already present.
pub fn updater_append(existing: &str, config: &InstallConfig) -> Option<String> {
    if count_updater_sections(existing, UPDATER_SECTION_NAME) > 0 {
        return None;
    }

    let mut addition = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        addition.push('\n');
    }
    addition.push_str(&render_updater_block(config));
    Some(addition)
}
