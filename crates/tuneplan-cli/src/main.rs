use std::collections::BTreeMap;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use tuneplan_core::{
    config::{AdvancedTrainingConfig, OutputStyle, QualityPreset, TrainingConfig},
    instance::{self, InstanceType},
    model::{self, FineTuneType, ModelConfig, ModelSource},
    plan::build_plan,
    recommend::recommended_config,
    region::REGIONS,
};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_hot() -> Style    { Style::new().color256(114) }         // green
fn s_warm() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }
fn s_label() -> Style  { Style::new().color256(146) }         // muted lavender
fn s_param() -> Style  { Style::new().color256(139) }         // mauve

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn fmt_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}k", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn fmt_types(types: &[FineTuneType]) -> String {
    types.iter().map(|t| t.label()).collect::<Vec<_>>().join(", ")
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "tuneplan",
    about = "Plan LLM fine-tuning runs: pick a model, get hyperparameters, estimate the bill",
    version,
    after_help = "examples:\n  \
        tuneplan                                 (model catalog)\n  \
        tuneplan llama-3-8b                      (model details)\n  \
        tuneplan --source hf                     (Hugging Face models only)\n  \
        tuneplan --max-cost 2                    (models at or under $2/hr)\n  \
        tuneplan plan llama-3-8b --rows 2547\n  \
        tuneplan plan llama-3-70b --rows 50000 --preset high --max-cost 500\n  \
        tuneplan plan mistral-7b-v02 --rows 8000 --epochs 4 --batch-size 8\n  \
        tuneplan instances\n  \
        tuneplan instances g5.2xlarge            (instance detail)\n  \
        tuneplan sync"
)]
struct Cli {
    /// Model id or search text, e.g. llama-3-8b or code
    query: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Catalog filter: jumpstart (js) or huggingface (hf)
    #[arg(long)]
    source: Option<String>,

    /// Only models at or under this hourly instance rate
    #[arg(long)]
    max_cost: Option<f64>,

    #[arg(long, short)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Full training plan for a model: hyperparameters plus cost estimate.
    Plan {
        /// Model id, e.g. llama-3-8b
        model: String,
        /// Number of training examples in the dataset
        #[arg(long)]
        rows: u64,
        /// Quality preset: low, medium, high
        #[arg(long, short, default_value = "medium")]
        preset: String,
        /// Output style: instruction, chat, classification
        #[arg(long, default_value = "instruction")]
        style: String,
        /// Override the preset's epoch count
        #[arg(long)]
        epochs: Option<u32>,
        /// Override the preset's batch size
        #[arg(long)]
        batch_size: Option<u32>,
        /// Warn when the estimate can exceed this budget (USD)
        #[arg(long)]
        max_cost: Option<f64>,
        /// Warn when the run can exceed this many hours
        #[arg(long)]
        max_hours: Option<f64>,
    },
    /// Training instance types, or the detail for one of them.
    Instances {
        /// Instance name, e.g. ml.g5.2xlarge or g5.2xlarge
        name: Option<String>,
    },
    /// Supported AWS regions.
    Regions,
    /// Update model and instance data from GitHub
    Sync,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Plan {
            ref model,
            rows,
            ref preset,
            ref style,
            epochs,
            batch_size,
            max_cost,
            max_hours,
        }) => {
            cmd_plan(model, rows, preset, style, epochs, batch_size, max_cost, max_hours, cli.json)?;
        }
        Some(Commands::Instances { name }) => {
            cmd_instances(name.as_deref(), cli.json)?;
        }
        Some(Commands::Regions) => {
            cmd_regions()?;
        }
        Some(Commands::Sync) => {
            cmd_sync().await?;
        }
        None => {
            if let Some(ref query) = cli.query {
                cmd_model(query, cli.json)?;
            } else {
                cmd_catalog(&cli)?;
            }
        }
    }
    Ok(())
}

// ── Catalog ──────────────────────────────────────────────────────────

fn cmd_catalog(opts: &Cli) -> anyhow::Result<()> {
    let mut models = model::load_models_cached()?;

    if let Some(ref raw) = opts.source {
        let source = ModelSource::from_str(raw).map_err(|e| anyhow::anyhow!(e))?;
        models.retain(|(_, m)| m.source == source);
    }
    if let Some(cap) = opts.max_cost {
        models.retain(|(_, m)| m.cost_per_hour <= cap);
    }

    if models.is_empty() {
        eprintln!("{}", s_err().apply_to("error: no models match the filters"));
        return Ok(());
    }

    if opts.json {
        let by_id: BTreeMap<&str, &ModelConfig> =
            models.iter().map(|(k, m)| (k.as_str(), m)).collect();
        println!("{}", serde_json::to_string_pretty(&by_id)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("model catalog"));

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("  Model").fg(Color::AnsiValue(243)),
            Cell::new("Params").fg(Color::AnsiValue(243)),
            Cell::new("Ctx").fg(Color::AnsiValue(243)),
            Cell::new("$/hr").fg(Color::AnsiValue(243)),
            Cell::new("Fine-tune").fg(Color::AnsiValue(243)),
            Cell::new("Source").fg(Color::AnsiValue(243)),
        ]);

    for (key, m) in &models {
        table.add_row(vec![
            Cell::new(format!("  {key}")).fg(Color::AnsiValue(252)),
            Cell::new(&m.parameter_count).fg(Color::AnsiValue(139)),
            Cell::new(fmt_count(m.context_length)).fg(Color::AnsiValue(248)),
            Cell::new(format!("${:.2}", m.cost_per_hour)).fg(Color::AnsiValue(109)),
            Cell::new(fmt_types(&m.supported_fine_tune_types)).fg(Color::AnsiValue(248)),
            Cell::new(m.source.label()).fg(Color::AnsiValue(243)),
        ]);
    }
    println!("{table}");

    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} models   tuneplan <model> for details",
            models.len()
        ))
    );
    println!();
    Ok(())
}

// ── Model detail ─────────────────────────────────────────────────────

fn cmd_model(query: &str, json: bool) -> anyhow::Result<()> {
    let models = model::load_models_cached()?;

    // Exact catalog id goes straight to the detail view.
    if let Some((key, m)) = models.iter().find(|(k, _)| k == query) {
        return print_model(key, m, json);
    }

    let q = query.to_lowercase();
    let matches: Vec<_> = models
        .iter()
        .filter(|(k, m)| k.to_lowercase().contains(&q) || m.matches_query(query))
        .collect();

    match matches.as_slice() {
        [] => {
            eprintln!(
                "{}",
                s_err().apply_to(format!("error: no model matching '{query}' in the catalog"))
            );
            eprintln!();
            eprintln!("{}", s_dim().apply_to("  tuneplan         lists the catalog"));
            eprintln!("{}", s_dim().apply_to("  tuneplan sync    refreshes it from GitHub"));
            Ok(())
        }
        [(key, m)] => print_model(key, m, json),
        _ => {
            if json {
                let by_id: BTreeMap<&str, &ModelConfig> =
                    matches.iter().map(|(k, m)| (k.as_str(), m)).collect();
                println!("{}", serde_json::to_string_pretty(&by_id)?);
                return Ok(());
            }
            print_search_results(query, &matches);
            Ok(())
        }
    }
}

fn print_search_results(query: &str, matches: &[&(String, ModelConfig)]) {
    println!();
    println!(
        "{}",
        s_header().apply_to(format!("models matching '{query}'"))
    );
    println!("{}", sep(64));

    for (key, m) in matches {
        println!(
            "  {:<28} {:<8} {}",
            s_bold().apply_to(key.as_str()),
            s_param().apply_to(&m.parameter_count),
            s_dim().apply_to(fmt_types(&m.supported_fine_tune_types))
        );
    }

    println!("{}", sep(64));
    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} models   tuneplan <id> for details",
            matches.len()
        ))
    );
    println!();
}

fn print_model(key: &str, m: &ModelConfig, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(m)?);
        return Ok(());
    }

    println!();
    println!(
        "{}  {}  {}",
        s_bold().apply_to(&m.name),
        s_param().apply_to(&m.parameter_count),
        s_label().apply_to(m.source.label())
    );

    let dot = s_tree().apply_to("\u{00b7}");
    let mut badges = vec![
        s_hot().apply_to(m.license.as_str()).to_string(),
        s_label().apply_to(m.provider.as_str()).to_string(),
    ];
    for tag in &m.tags {
        badges.push(s_dim().apply_to(tag.as_str()).to_string());
    }
    println!("  {}", badges.join(&format!("  {dot}  ")));
    println!("  {}", s_dim().apply_to(&m.description));

    println!();
    println!("{}", sep(64));
    println!(
        "  {:<16} {}",
        s_label().apply_to("platform id"),
        s_dim().apply_to(&m.platform_id)
    );
    println!(
        "  {:<16} {}",
        s_label().apply_to("context"),
        s_dim().apply_to(format!("{} tokens", fmt_count(m.context_length)))
    );
    println!(
        "  {:<16} {}",
        s_label().apply_to("fine-tune"),
        s_dim().apply_to(fmt_types(&m.supported_fine_tune_types))
    );
    println!(
        "  {:<16} {}  {}",
        s_label().apply_to("instance"),
        s_bold().apply_to(&m.recommended_instance),
        s_price().apply_to(format!("${:.2}/hr", m.cost_per_hour))
    );
    println!(
        "  {:<16} {}",
        s_label().apply_to("min GPU mem"),
        s_dim().apply_to(format!("{:.0} GB", m.min_gpu_memory_gb))
    );
    println!("{}", sep(64));
    println!(
        "{}",
        s_hint().apply_to(format!("  tuneplan plan {key} --rows <n> for a full plan"))
    );
    println!();
    Ok(())
}

// ── Plan ─────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn cmd_plan(
    query: &str,
    rows: u64,
    preset: &str,
    style: &str,
    epochs: Option<u32>,
    batch_size: Option<u32>,
    max_cost: Option<f64>,
    max_hours: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let models = model::load_models_cached()?;
    let instances = instance::load_instances_cached()?;
    let (key, m) = model::resolve_model(&models, query)?;

    let preset = QualityPreset::from_str(preset).map_err(|e| anyhow::anyhow!(e))?;
    let style = OutputStyle::from_str(style).map_err(|e| anyhow::anyhow!(e))?;

    let mut config = TrainingConfig::with_preset(preset, style);
    config.simple.max_cost_usd = max_cost;
    config.simple.max_hours = max_hours;
    if epochs.is_some() || batch_size.is_some() {
        let mut adv: AdvancedTrainingConfig = recommended_config(m, rows, preset)?.into();
        if let Some(e) = epochs {
            adv.epochs = e;
        }
        if let Some(b) = batch_size {
            adv.batch_size = b;
        }
        config.advanced = Some(adv);
        config.use_advanced = true;
    }

    let plan = build_plan(&instances, key, m, rows, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}  {}",
        s_header().apply_to(&plan.model_name),
        s_param().apply_to(&m.parameter_count)
    );
    let dot = s_tree().apply_to("\u{00b7}");
    let specs = [
        format!("{} rows", fmt_count(plan.dataset_size)),
        format!("{} preset", preset.label()),
        style.label().to_string(),
    ];
    println!("  {}", s_dim().apply_to(specs.join(&format!("  {dot}  "))));

    let c = &plan.config;
    println!();
    println!("{}", s_header().apply_to("training configuration"));
    println!("{}", sep(64));
    let quant = match c.quantization_bits {
        Some(bits) => s_dim().apply_to(format!("({bits}-bit)")).to_string(),
        None => String::new(),
    };
    println!(
        "  {:<24} {}  {}",
        s_label().apply_to("fine-tune type"),
        s_bold().apply_to(c.fine_tune_type.label()),
        quant
    );
    println!("  {:<24} {}", s_label().apply_to("epochs"), c.epochs);
    println!(
        "  {:<24} {}",
        s_label().apply_to("learning rate"),
        format_args!("{:e}", c.learning_rate)
    );
    println!("  {:<24} {}", s_label().apply_to("batch size"), c.batch_size);
    println!("  {:<24} {}", s_label().apply_to("warmup ratio"), c.warmup_ratio);
    println!(
        "  {:<24} {}",
        s_label().apply_to("gradient checkpointing"),
        if c.gradient_checkpointing { "on" } else { "off" }
    );
    println!(
        "  {:<24} {}",
        s_label().apply_to("packing"),
        if c.packing { "on" } else { "off" }
    );
    if let (Some(rank), Some(alpha)) = (c.lora_rank, c.lora_alpha) {
        println!(
            "  {:<24} {}",
            s_label().apply_to("lora rank / alpha"),
            s_dim().apply_to(format!("{rank} / {alpha}"))
        );
    }
    if let Some(steps) = c.max_steps {
        println!("  {:<24} {}", s_label().apply_to("max steps"), steps);
    }
    println!("{}", sep(64));

    println!();
    match instance::find_instance(&instances, &plan.instance_type) {
        Some(rate) => {
            println!(
                "  {}  {}",
                s_price().apply_to(format!(
                    "${:.2} \u{2013} ${:.2}",
                    plan.estimate.min_cost, plan.estimate.max_cost
                )),
                s_dim().apply_to(format!(
                    "~{:.1} h on {} (${:.2}/hr)",
                    plan.estimate.estimated_hours, plan.instance_type, rate.cost_per_hour
                ))
            );
        }
        None => {
            println!(
                "  {}",
                s_warm().apply_to(format!("cost unavailable: no pricing for {}", plan.instance_type))
            );
        }
    }

    for w in &plan.warnings {
        println!("  {}", s_warm().apply_to(format!("\u{26a0} {w}")));
    }

    println!();
    println!(
        "{}",
        s_hint().apply_to("  adjust with --preset, --epochs, --batch-size, --max-cost")
    );
    println!();
    Ok(())
}

// ── Instances ────────────────────────────────────────────────────────

fn cmd_instances(name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut instances = instance::load_instances_cached()?;

    if let Some(query) = name {
        let Some((key, inst)) = instance::match_instance(&instances, query) else {
            eprintln!(
                "{}",
                s_err().apply_to(format!("error: no instance matching '{query}'"))
            );
            return Ok(());
        };

        if json {
            println!("{}", serde_json::to_string_pretty(inst)?);
            return Ok(());
        }

        println!();
        println!("  {}", s_header().apply_to(key));
        let dot = s_tree().apply_to("\u{00b7}");
        let specs = [
            format!("{:.0} GB GPU memory", inst.gpu_memory_gb),
            format!("{} vCPUs", inst.vcpus),
        ];
        println!("  {}", s_dim().apply_to(specs.join(&format!("  {dot}  "))));
        println!("  {}", s_price().apply_to(format!("${:.2}/hr on-demand", inst.cost_per_hour)));

        let models = model::load_models_cached()?;
        let fits: Vec<_> = models.iter().filter(|(_, m)| m.recommended_instance == key).collect();
        if !fits.is_empty() {
            println!();
            println!("{}", s_header().apply_to("recommended for"));
            println!("{}", sep(64));
            for (id, m) in &fits {
                println!(
                    "  {:<28} {:<8} {}",
                    s_bold().apply_to(id.as_str()),
                    s_param().apply_to(&m.parameter_count),
                    s_dim().apply_to(fmt_types(&m.supported_fine_tune_types))
                );
            }
            println!("{}", sep(64));
        }
        println!();
        return Ok(());
    }

    instances.sort_by(|a, b| {
        a.1.cost_per_hour
            .partial_cmp(&b.1.cost_per_hour)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if json {
        let by_id: BTreeMap<&str, &InstanceType> =
            instances.iter().map(|(k, i)| (k.as_str(), i)).collect();
        println!("{}", serde_json::to_string_pretty(&by_id)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("training instances"));

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("  Instance").fg(Color::AnsiValue(243)),
            Cell::new("GPU mem").fg(Color::AnsiValue(243)),
            Cell::new("vCPUs").fg(Color::AnsiValue(243)),
            Cell::new("$/hr").fg(Color::AnsiValue(243)),
        ]);

    for (key, i) in &instances {
        table.add_row(vec![
            Cell::new(format!("  {key}")).fg(Color::AnsiValue(252)),
            Cell::new(format!("{:.0} GB", i.gpu_memory_gb)).fg(Color::AnsiValue(248)),
            Cell::new(i.vcpus).fg(Color::AnsiValue(248)),
            Cell::new(format!("${:.2}", i.cost_per_hour)).fg(Color::AnsiValue(109)),
        ]);
    }
    println!("{table}");

    println!(
        "{}",
        s_hint().apply_to(format!(
            "  {} instance types   tuneplan plan <model> --rows <n> to price a run",
            instances.len()
        ))
    );
    println!();
    Ok(())
}

// ── Regions ──────────────────────────────────────────────────────────

fn cmd_regions() -> anyhow::Result<()> {
    println!();
    println!("{}", s_header().apply_to("supported regions"));
    println!("{}", sep(64));

    for r in REGIONS {
        println!(
            "  {:<16} {}",
            s_bold().apply_to(r.id),
            s_dim().apply_to(r.name)
        );
    }

    println!("{}", sep(64));
    println!(
        "{}",
        s_hint().apply_to(format!("  {} regions", REGIONS.len()))
    );
    println!();
    Ok(())
}

// ── Sync ─────────────────────────────────────────────────────────────

async fn cmd_sync() -> anyhow::Result<()> {
    let term = Term::stderr();
    term.write_line(&format!("{}", s_dim().apply_to("downloading latest data...")))?;

    let result = tuneplan_core::sync::sync_data().await?;

    term.clear_last_lines(1)?;
    let now = chrono::Local::now().format("%H:%M:%S");
    println!();
    println!(
        "  {}  {}",
        s_hot().apply_to("synced"),
        s_dim().apply_to(format!("at {now}"))
    );
    println!(
        "  {}",
        s_dim().apply_to(format!(
            "models.toml: {} models   instances.toml: {} instance types",
            result.model_count, result.instance_count
        ))
    );
    if let Some(dir) = tuneplan_core::sync::cache_dir() {
        println!(
            "  {}",
            s_hint().apply_to(format!("cached in {}", dir.display()))
        );
    }
    println!();
    Ok(())
}
