use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use gspaas_core::differ::create_plan;
use gspaas_core::effect::Effect;
use gspaas_core::plan::Plan;
use gspaas_core::provider::{Provider, ProviderResult};
use gspaas_core::resource::{Resource, ResourceId, State, Value};
use gspaas_core::schema::ResourceSchema;
use gspaas_provider::fake::{InMemoryApi, Snapshot};
use gspaas_provider::flavour::Flavour;
use gspaas_provider::index::TemplateIndex;
use gspaas_provider::resources;
use gspaas_provider::{GridscaleProvider, ProviderConfig};

const DEFAULT_API: &str = ".gspaas/api.json";
const DEFAULT_STATE: &str = ".gspaas/state.json";

#[derive(Parser)]
#[command(name = "gspaas")]
#[command(about = "Manage gridscale PaaS services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Remote {
    /// Path to the JSON snapshot of the gridscale API
    #[arg(long, default_value = DEFAULT_API)]
    api: PathBuf,

    /// Path to the local state file
    #[arg(long, default_value = DEFAULT_STATE)]
    state: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Path to the resources file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to the resources file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        #[command(flatten)]
        remote: Remote,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to the resources file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        #[command(flatten)]
        remote: Remote,
    },
    /// Destroy every resource tracked in state
    Destroy {
        /// Path to the resources file
        #[arg(default_value = "main.json")]
        file: PathBuf,

        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,

        #[command(flatten)]
        remote: Remote,
    },
    /// Adopt an existing object into state
    Import {
        /// Resource type (e.g. gridscale_postgresql)
        resource_type: String,
        /// Resource name
        name: String,
        /// Object UUID of the existing object
        uuid: String,

        #[command(flatten)]
        remote: Remote,
    },
    /// List releases and performance classes offered for a flavour
    Templates {
        /// Flavour tag (e.g. mariadb, kubernetes, redis-store)
        flavour: String,

        /// Path to the JSON snapshot of the gridscale API
        #[arg(long, default_value = DEFAULT_API)]
        api: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file, remote } => run_plan(&file, &remote).await,
        Commands::Apply { file, remote } => run_apply(&file, &remote).await,
        Commands::Destroy {
            file,
            auto_approve,
            remote,
        } => run_destroy(&file, auto_approve, &remote).await,
        Commands::Import {
            resource_type,
            name,
            uuid,
            remote,
        } => run_import(ResourceId::new(resource_type, name), &uuid, &remote).await,
        Commands::Templates { flavour, api } => run_templates(&flavour, &api).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

// =============================================================================
// Configuration File
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    /// Provider block, see `ProviderConfig::from_attributes`
    #[serde(default)]
    provider: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

struct Configuration {
    provider: HashMap<String, Value>,
    resources: Vec<Resource>,
}

fn load_configuration(file: &Path) -> Result<Configuration, String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let parsed: ConfigFile =
        serde_json::from_str(&content).map_err(|e| format!("Parse error: {}", e))?;

    let mut resources: Vec<Resource> = Vec::new();
    for entry in parsed.resources {
        let resource = Resource {
            id: ResourceId::new(entry.resource_type, entry.name),
            attributes: json_attributes(&entry.attributes),
        };
        if resources.iter().any(|r| r.id == resource.id) {
            return Err(format!("Duplicate resource {}", resource.id));
        }
        resources.push(resource);
    }

    Ok(Configuration {
        provider: json_attributes(&parsed.provider),
        resources,
    })
}

/// JSON object to attributes; `null` means unset
fn json_attributes(map: &serde_json::Map<String, serde_json::Value>) -> HashMap<String, Value> {
    map.iter()
        .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}

fn validate_resources(resources: &[Resource]) -> Result<(), String> {
    let schemas = resources::schemas();
    let mut all_errors = Vec::new();

    for resource in resources {
        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            all_errors.push(format!(
                "{}: unknown resource type '{}'",
                resource.id, resource.id.resource_type
            ));
            continue;
        };
        if let Err(errors) = schema.validate(&resource.attributes) {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        all_errors.sort();
        Err(all_errors.join("\n"))
    }
}

// =============================================================================
// State File
// =============================================================================

/// Object UUID backing each managed resource, keyed by `type.name`
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    objects: BTreeMap<String, String>,
}

impl StateFile {
    fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read state {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Malformed state {}: {}", path.display(), e))
    }

    fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| format!("Failed to save state: {}", e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to save state: {}", e))?;
        fs::write(path, content).map_err(|e| format!("Failed to save state: {}", e))
    }

    fn identifier(&self, id: &ResourceId) -> Option<&str> {
        self.objects.get(&id.to_string()).map(String::as_str)
    }

    fn record(&mut self, state: &State) {
        if let Some(identifier) = &state.identifier {
            self.objects.insert(state.id.to_string(), identifier.clone());
        }
    }

    fn forget(&mut self, id: &ResourceId) {
        self.objects.remove(&id.to_string());
    }

    fn ids(&self) -> Vec<ResourceId> {
        self.objects
            .keys()
            .filter_map(|key| key.split_once('.'))
            .map(|(resource_type, name)| ResourceId::new(resource_type, name))
            .collect()
    }
}

// =============================================================================
// Session
// =============================================================================

/// Provider wired to the snapshot-backed API, plus the local state
struct Session {
    api: Arc<InMemoryApi>,
    provider: GridscaleProvider,
    remote: Remote,
    state: StateFile,
}

impl Session {
    fn open(remote: &Remote, provider_attributes: &HashMap<String, Value>) -> Result<Self, String> {
        let config = ProviderConfig::from_attributes(provider_attributes)
            .map_err(|e| format!("Invalid provider configuration: {}", e))?;
        let api = Arc::new(InMemoryApi::new(load_snapshot(&remote.api)?));
        Ok(Self {
            provider: GridscaleProvider::with_config(api.clone(), config),
            api,
            remote: remote.clone(),
            state: StateFile::load(&remote.state)?,
        })
    }

    async fn save(&self) -> Result<(), String> {
        self.api
            .snapshot()
            .await
            .save(&self.remote.api)
            .map_err(|e| e.to_string())?;
        self.state.save(&self.remote.state)
    }

    /// Current state of every desired or tracked resource
    async fn read_states(
        &self,
        resources: &[Resource],
    ) -> Result<HashMap<ResourceId, State>, String> {
        let mut ids: Vec<ResourceId> = resources.iter().map(|r| r.id.clone()).collect();
        for id in self.state.ids() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut states = HashMap::new();
        for id in ids {
            let state = self
                .provider
                .read(&id, self.state.identifier(&id))
                .await
                .map_err(|e| format!("Failed to read state: {}", e))?;
            states.insert(id, state);
        }
        Ok(states)
    }

    /// Run the plan-time checks of every resource, then diff against current state
    async fn plan(&self, resources: &[Resource]) -> Result<Plan, String> {
        let states = self.read_states(resources).await?;

        let mut errors = Vec::new();
        for resource in resources {
            let prior = states.get(&resource.id).filter(|s| s.exists);
            if let Err(e) = self.provider.plan(resource, prior).await {
                errors.push(e.to_string());
            }
        }
        if !errors.is_empty() {
            return Err(errors.join("\n"));
        }

        Ok(create_plan(resources, &states, &resources::schemas()))
    }

    async fn apply_effect(&mut self, effect: &Effect) -> ProviderResult<()> {
        match effect {
            Effect::Create(resource) => {
                let state = self.provider.create(resource).await?;
                self.state.record(&state);
            }
            Effect::Update { id, from, to, .. } => {
                let identifier = from.identifier.clone().unwrap_or_default();
                self.provider.update(id, &identifier, from, to).await?;
            }
            Effect::Replace { id, from, to, .. } => {
                if let Some(identifier) = &from.identifier {
                    self.provider.delete(id, identifier).await?;
                }
                self.state.forget(id);
                let state = self.provider.create(to).await?;
                self.state.record(&state);
            }
            Effect::Delete { id, identifier } => {
                self.provider.delete(id, identifier).await?;
                self.state.forget(id);
            }
            Effect::Read(_) => {}
        }
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot, String> {
    if !path.exists() {
        log::warn!("{} does not exist, starting from an empty API", path.display());
        return Ok(Snapshot::default());
    }
    Snapshot::load(path).map_err(|e| format!("{}: {}", path.display(), e))
}

// =============================================================================
// Commands
// =============================================================================

fn run_validate(file: &Path) -> Result<(), String> {
    let configuration = load_configuration(file)?;

    println!("{}", "Validating...".cyan());

    validate_resources(&configuration.resources)?;

    println!(
        "{}",
        format!(
            "✓ {} resources validated successfully.",
            configuration.resources.len()
        )
        .green()
        .bold()
    );

    for resource in &configuration.resources {
        println!("  • {}", resource.id);
    }

    Ok(())
}

async fn run_plan(file: &Path, remote: &Remote) -> Result<(), String> {
    let configuration = load_configuration(file)?;
    validate_resources(&configuration.resources)?;

    let session = Session::open(remote, &configuration.provider)?;
    let plan = session.plan(&configuration.resources).await?;
    print_plan(&plan, &resources::schemas());
    Ok(())
}

async fn run_apply(file: &Path, remote: &Remote) -> Result<(), String> {
    let configuration = load_configuration(file)?;
    validate_resources(&configuration.resources)?;

    let mut session = Session::open(remote, &configuration.provider)?;
    let plan = session.plan(&configuration.resources).await?;

    if plan.is_empty() {
        println!("{}", "No changes needed.".green());
        return Ok(());
    }

    print_plan(&plan, &resources::schemas());
    println!();

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for effect in plan.effects() {
        match session.apply_effect(effect).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect(effect));
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(effect), e);
                failure_count += 1;
            }
        }
    }

    session.save().await?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Apply complete! {} changes applied.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Apply failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_destroy(file: &Path, auto_approve: bool, remote: &Remote) -> Result<(), String> {
    let configuration = load_configuration(file)?;
    let mut session = Session::open(remote, &configuration.provider)?;

    // Reverse declaration order first, then whatever else state still tracks
    let tracked = session.state.ids();
    let mut destroy_order: Vec<ResourceId> = configuration
        .resources
        .iter()
        .rev()
        .map(|r| r.id.clone())
        .filter(|id| tracked.contains(id))
        .collect();
    for id in tracked {
        if !destroy_order.contains(&id) {
            destroy_order.push(id);
        }
    }

    let mut to_destroy: Vec<(ResourceId, String)> = Vec::new();
    for id in destroy_order {
        let state = session
            .provider
            .read(&id, session.state.identifier(&id))
            .await
            .map_err(|e| format!("Failed to read state: {}", e))?;
        match state.identifier {
            Some(identifier) if state.exists => to_destroy.push((id, identifier)),
            _ => session.state.forget(&id),
        }
    }

    if to_destroy.is_empty() {
        session.save().await?;
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for (id, identifier) in &to_destroy {
        println!("  {} {} ({})", "-".red().bold(), id, identifier.dimmed());
    }
    println!();
    println!("Plan: {} to destroy.", to_destroy.len().to_string().red());
    println!();

    if !auto_approve {
        println!(
            "{}",
            "Do you really want to destroy all resources?"
                .yellow()
                .bold()
        );
        println!(
            "  {}",
            "This action cannot be undone. Type 'yes' to confirm.".yellow()
        );
        print!("\n  Enter a value: ");
        std::io::Write::flush(&mut std::io::stdout()).map_err(|e| e.to_string())?;

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .map_err(|e| e.to_string())?;

        if input.trim() != "yes" {
            println!();
            println!("{}", "Destroy cancelled.".yellow());
            return Ok(());
        }
        println!();
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let mut success_count = 0;
    let mut failure_count = 0;

    for (id, identifier) in to_destroy {
        let effect = Effect::Delete { id, identifier };
        match session.apply_effect(&effect).await {
            Ok(()) => {
                println!("  {} {}", "✓".green(), format_effect(&effect));
                success_count += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), format_effect(&effect), e);
                failure_count += 1;
            }
        }
    }

    session.save().await?;

    println!();
    if failure_count == 0 {
        println!(
            "{}",
            format!("Destroy complete! {} resources destroyed.", success_count)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "Destroy failed. {} succeeded, {} failed.",
            success_count, failure_count
        ))
    }
}

async fn run_import(id: ResourceId, uuid: &str, remote: &Remote) -> Result<(), String> {
    let mut session = Session::open(remote, &HashMap::new())?;
    if let Some(existing) = session.state.identifier(&id) {
        return Err(format!("{} is already managed as {}", id, existing));
    }

    let state = session
        .provider
        .import(&id, uuid)
        .await
        .map_err(|e| e.to_string())?;
    session.state.record(&state);
    session.state.save(&remote.state)?;

    println!("{} {}", "Imported".green().bold(), id.to_string().cyan().bold());
    if let Some(schema) = resources::schemas().get(&id.resource_type) {
        print_attributes(&schema.redacted(&state.attributes), "    ");
    }
    Ok(())
}

async fn run_templates(flavour: &str, api: &Path) -> Result<(), String> {
    let flavour: Flavour = flavour.parse().map_err(|e| {
        let known: Vec<&str> = Flavour::ALL.iter().map(|f| f.as_str()).collect();
        format!("{} (known flavours: {})", e, known.join(", "))
    })?;
    let api = Arc::new(InMemoryApi::new(load_snapshot(api)?));
    let provider = GridscaleProvider::new(api);
    let catalog = provider.templates().await.map_err(|e| e.to_string())?;

    let index = TemplateIndex::new(&catalog, flavour);
    if index.is_empty() {
        println!(
            "{}",
            format!("No {} releases are available.", flavour.display_name()).yellow()
        );
        return Ok(());
    }

    println!("{}", format!("{} releases:", flavour.display_name()).cyan().bold());
    for release in index.releases() {
        let classes: Vec<&str> = index.classes_for(release).into_iter().collect();
        println!("  {} {}", release.bold(), classes.join(", "));
    }
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn print_plan(plan: &Plan, schemas: &HashMap<String, ResourceSchema>) {
    if plan.is_empty() {
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    let attr_prefix = "    ";
    for effect in plan.effects() {
        let schema = schemas.get(&effect.resource_id().resource_type);
        let redact = |attributes: &HashMap<String, Value>| match schema {
            Some(schema) => schema.redacted(attributes),
            None => attributes.clone(),
        };

        match effect {
            Effect::Create(r) => {
                println!("  {} {}", "+".green().bold(), r.id.to_string().cyan().bold());
                print_attributes(&redact(&r.attributes), attr_prefix);
            }
            Effect::Update {
                id,
                from,
                to,
                changed_attributes,
            }
            | Effect::Replace {
                id,
                from,
                to,
                changed_attributes,
            } => {
                let replace = matches!(effect, Effect::Replace { .. });
                let symbol = if replace {
                    "-/+".magenta().bold()
                } else {
                    "~".yellow().bold()
                };
                println!("  {} {}", symbol, id.to_string().cyan().bold());

                let old = redact(&from.attributes);
                let new = redact(&to.attributes);
                for key in changed_attributes {
                    let old_str = old
                        .get(key)
                        .map(format_value)
                        .unwrap_or_else(|| "(none)".to_string());
                    let new_str = new
                        .get(key)
                        .map(format_value)
                        .unwrap_or_else(|| "(none)".to_string());
                    let forces = if schema.is_some_and(|s| s.is_force_new(key)) {
                        " (forces replacement)".magenta().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "{}{}: {} → {}{}",
                        attr_prefix,
                        key,
                        old_str.red(),
                        new_str.green(),
                        forces
                    );
                }
            }
            Effect::Delete { id, identifier } => {
                println!("  {} {}", "-".red().bold(), id.to_string().cyan().bold());
                println!("{}{}: {}", attr_prefix, "name".bold(), id.name.red().bold());
                println!("{}{}: {}", attr_prefix, "uuid", identifier.red());
            }
            Effect::Read(_) => {}
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to add, {} to change, {} to replace, {} to destroy.",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().magenta(),
        summary.delete.to_string().red()
    );
}

fn print_attributes(attributes: &HashMap<String, Value>, prefix: &str) {
    let mut keys: Vec<_> = attributes.keys().filter(|k| !k.starts_with('_')).collect();
    keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        ("name", _) => std::cmp::Ordering::Less,
        (_, "name") => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    for key in keys {
        let value = &attributes[key];
        if key == "name" {
            println!(
                "{}{}: {}",
                prefix,
                key.bold(),
                format_value(value).white().bold()
            );
        } else {
            println!("{}{}: {}", prefix, key, format_value(value).green());
        }
    }
}

fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Replace { id, .. } => format!("Replace {}", id),
        Effect::Delete { id, .. } => format!("Delete {}", id),
        Effect::Read(id) => format!("Read {}", id),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut strs: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            strs.sort();
            format!("{{{}}}", strs.join(", "))
        }
    }
}
