use std::io::{self, Write};

use anyhow::Context;
use randexp::regex::parse_regex;
use randexp::{Engine, Flags, GeneratorConfig, SeededRandom};

use crate::cli::{Config, resolve_use_color};
use crate::output::format_generation;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let use_color = resolve_use_color(&cfg.color);

    let flags = Flags::parse(&cfg.flags).with_context(|| format!("bad flags {:?}", cfg.flags))?;
    let pattern =
        parse_regex(&cfg.pattern).with_context(|| format!("cannot compile {:?}", cfg.pattern))?;
    let config = GeneratorConfig::from_flags(flags.union(pattern.inline_flags))
        .with_repeat_cap(cfg.max);

    let mut engine = Engine::from_pattern(pattern, config);
    if let Some(seed) = cfg.seed {
        engine = engine.with_rng(SeededRandom::new(seed));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(log) = &cfg.replay {
        let generation = engine
            .generate_from_log(log.as_slice())
            .with_context(|| format!("cannot replay [{log}]"))?;
        writeln!(out, "{}", format_generation(&generation, cfg.show_log, use_color))?;
        return Ok(());
    }

    for _ in 0..cfg.count {
        let generation = engine.generate(cfg.target.as_deref())?;
        writeln!(out, "{}", format_generation(&generation, cfg.show_log, use_color))?;
    }
    Ok(())
}
