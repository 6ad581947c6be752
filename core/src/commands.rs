//! Runtime command dispatch
//!
//! A small closed set of literal tokens, recognized only when the input
//! text is exactly one of them; anything else falls through to normal
//! rewriting. Version, reload, and the command gate itself are always
//! live; the remaining toggles answer only while the gate is on. Every
//! toggle persists its new value immediately, so a switch flipped at
//! runtime survives a restart.

use crate::config::FilterConfig;
use crate::context::FilterContext;

/// Try to interpret `text` as a command. Returns the feedback string to
/// hand back in place of a translation, or `None` to fall through.
pub fn dispatch(text: &str, ctx: &FilterContext) -> Option<String> {
    match text {
        "/ver" | "/version" => Some(version_report()),
        "/reload" => Some(reload_report(ctx)),
        "/command" => Some(flip(ctx, "commands", |c| &mut c.commands)),
        _ => {
            if !ctx.config().snapshot().commands {
                return None;
            }
            let reply = match text {
                "/pre" => flip(ctx, "pre filter", |c| &mut c.pre_filter),
                "/preon" => set(ctx, "pre filter", true, |c| &mut c.pre_filter),
                "/preoff" => set(ctx, "pre filter", false, |c| &mut c.pre_filter),
                "/post" => flip(ctx, "post filter", |c| &mut c.post_filter),
                "/poston" => set(ctx, "post filter", true, |c| &mut c.post_filter),
                "/postoff" => set(ctx, "post filter", false, |c| &mut c.post_filter),
                "/dic" => flip(ctx, "user dictionary", |c| &mut c.user_dict),
                "/dicon" => set(ctx, "user dictionary", true, |c| &mut c.user_dict),
                "/dicoff" => set(ctx, "user dictionary", false, |c| &mut c.user_dict),
                "/log_rewrites" => flip(ctx, "rewrite logging", |c| &mut c.log_rewrites),
                _ => return None,
            };
            Some(reply)
        }
    }
}

fn version_report() -> String {
    format!("nikkan {}", env!("CARGO_PKG_VERSION"))
}

fn reload_report(ctx: &FilterContext) -> String {
    let (snapshot, dictionary) = ctx.reload_all();
    format!(
        "reloaded: {} pre rules, {} post rules, {} skip conditions, {} terms",
        snapshot.pre_rules.len(),
        snapshot.post_rules.len(),
        snapshot.skip_conditions.len(),
        dictionary.entries.len()
    )
}

fn flip(
    ctx: &FilterContext,
    label: &str,
    field: impl FnOnce(&mut FilterConfig) -> &mut bool,
) -> String {
    let mut state = false;
    ctx.config().update(|c| {
        let slot = field(c);
        *slot = !*slot;
        state = *slot;
    });
    switch_report(label, state)
}

fn set(
    ctx: &FilterContext,
    label: &str,
    value: bool,
    field: impl FnOnce(&mut FilterConfig) -> &mut bool,
) -> String {
    ctx.config().update(|c| *field(c) = value);
    switch_report(label, value)
}

fn switch_report(label: &str, on: bool) -> String {
    format!("{label} {}", if on { "on" } else { "off" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigHandle;
    use std::fs;

    fn context_in(dir: &std::path::Path) -> FilterContext {
        let handle = ConfigHandle::load_path(dir.join("nikkan.toml"));
        handle.update(|c| {
            c.dict_directory = dir.join("dict").to_string_lossy().to_string();
            c.export_directory = Some(dir.join("export").to_string_lossy().to_string());
        });
        fs::create_dir_all(dir.join("dict")).unwrap();
        fs::create_dir_all(dir.join("export")).unwrap();
        FilterContext::new(handle)
    }

    #[test]
    fn version_reports_name_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        let reply = dispatch("/ver", &ctx).unwrap();
        assert!(reply.contains(env!("CARGO_PKG_VERSION")));
        assert_eq!(dispatch("/version", &ctx).unwrap(), reply);
    }

    #[test]
    fn toggles_flip_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());

        assert_eq!(dispatch("/pre", &ctx).unwrap(), "pre filter off");
        assert!(!ctx.config().snapshot().pre_filter);

        // The new value is on disk, not just in memory
        let reread = ConfigHandle::load_path(dir.path().join("nikkan.toml"));
        assert!(!reread.snapshot().pre_filter);

        assert_eq!(dispatch("/preon", &ctx).unwrap(), "pre filter on");
        assert!(ctx.config().snapshot().pre_filter);
        assert_eq!(dispatch("/dicoff", &ctx).unwrap(), "user dictionary off");
        assert!(!ctx.config().snapshot().user_dict);
    }

    #[test]
    fn gated_tokens_ignored_while_gate_is_off() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        ctx.config().update(|c| c.commands = false);

        assert_eq!(dispatch("/preoff", &ctx), None);
        assert!(ctx.config().snapshot().pre_filter);

        // The gate itself always answers, so commands can come back
        assert_eq!(dispatch("/command", &ctx).unwrap(), "commands on");
        assert_eq!(dispatch("/preoff", &ctx).unwrap(), "pre filter off");
    }

    #[test]
    fn non_commands_fall_through() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        assert_eq!(dispatch("/x", &ctx), None);
        assert_eq!(dispatch("hello", &ctx), None);
        assert_eq!(dispatch("", &ctx), None);
        assert_eq!(dispatch(" /pre", &ctx), None);
    }

    #[test]
    fn reload_reports_what_it_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());
        fs::write(
            dir.path().join("dict/PreFilter_base.txt"),
            "abc\txyz\t0\t0\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("dict/UserDict_base.txt"),
            "猫\t고양이\t0\n",
        )
        .unwrap();

        let reply = dispatch("/reload", &ctx).unwrap();
        assert!(reply.contains("1 pre rules"));
        assert!(reply.contains("1 terms"));
        assert_eq!(ctx.rules().current().generation, 1);
        assert_eq!(ctx.dictionary().current().generation, 1);
    }
}
