//! Knowledge Graph Builder CLI
//!
//! Previews a CSV dataset, infers its schema, loads it into the graph store,
//! runs queries and writes path visualizations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use kgbuilder::query::predefined;
use kgbuilder::{
    infer_schema, AppConfig, Dataset, EmbeddedClient, GraphClient, GraphLoader, InferredSchema,
    LLMProvider, LoadReport, QueryResult, RemoteClient, SchemaRefiner, VisGraph, VizError,
    PREDEFINED_QUERIES,
};

#[derive(Parser)]
#[command(name = "kgbuilder", version, about = "Build and explore a knowledge graph from tabular data")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "KGB_CONFIG")]
    config: Option<PathBuf>,

    /// Neo4j HTTP URL
    #[arg(long, global = true, env = "KGB_NEO4J_URL")]
    url: Option<String>,

    /// Neo4j user
    #[arg(long, global = true, env = "KGB_NEO4J_USER")]
    user: Option<String>,

    /// Neo4j password
    #[arg(long, global = true, env = "KGB_NEO4J_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Neo4j database
    #[arg(long, global = true, env = "KGB_NEO4J_DATABASE")]
    database: Option<String>,

    /// LLM provider for schema refinement (gemini, openai, ollama, mock)
    #[arg(long, global = true, env = "KGB_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM model name
    #[arg(long, global = true, env = "KGB_LLM_MODEL")]
    model: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the first rows of a dataset
    Preview {
        csv: PathBuf,

        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Infer entities, relationships and properties from a dataset's columns
    Infer { csv: PathBuf },
    /// Populate the knowledge graph from a dataset
    Load {
        csv: PathBuf,

        /// Load into an in-process graph instead of the server
        #[arg(long)]
        embedded: bool,

        /// With --embedded, write the loaded graph as an HTML page
        #[arg(long, requires = "embedded")]
        viz: Option<PathBuf>,
    },
    /// Execute a Cypher query
    Query {
        /// The Cypher query string
        cypher: Option<String>,

        /// Run a predefined query by number (see `examples`)
        #[arg(long, conflicts_with = "cypher")]
        example: Option<usize>,

        /// Write path results as an HTML page
        #[arg(long)]
        viz: Option<PathBuf>,
    },
    /// List the predefined queries
    Examples,
    /// Ask the LLM to suggest schema improvements
    Refine {
        csv: PathBuf,

        /// Record your own relationship instead of asking the LLM
        #[arg(long)]
        custom: Option<String>,
    },
    /// Start an interactive query shell
    Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.store.url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.store.user = user.clone();
    }
    if let Some(password) = &cli.password {
        config.store.password = password.clone();
    }
    if let Some(database) = &cli.database {
        config.store.database = database.clone();
    }
    if let Some(provider) = &cli.provider {
        config.refine.provider = provider.parse::<LLMProvider>()?;
    }
    if let Some(model) = &cli.model {
        config.refine.model = model.clone();
    }

    Ok(config)
}

fn read_dataset(path: &Path) -> anyhow::Result<Dataset> {
    Dataset::from_path(path).with_context(|| format!("loading dataset {}", path.display()))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Preview { csv, rows } => {
            let dataset = read_dataset(csv)?;
            print_dataset(&dataset.head(*rows), &cli.format)?;
            println!("{} row(s) total", dataset.len());
        }
        Commands::Infer { csv } => {
            let dataset = read_dataset(csv)?;
            let schema = infer_schema(dataset.columns());
            print_schema(&schema, &cli.format)?;
        }
        Commands::Load { csv, embedded, viz } => {
            let dataset = read_dataset(csv)?;
            if *embedded {
                let client = EmbeddedClient::new();
                let outcome = load_embedded(&client, &dataset, viz.as_deref(), &cli.format).await;
                client.close().await?;
                outcome?;
            } else {
                let client = RemoteClient::connect(&config.store)
                    .await
                    .with_context(|| format!("connecting to {}", config.store.url))?;
                let outcome = GraphLoader::new(&client).load(&dataset).await;
                client.close().await?;
                print_report(&outcome?, &cli.format)?;
                println!("Knowledge graph populated successfully!");
            }
        }
        Commands::Query { cypher, example, viz } => {
            let query = match (cypher, example) {
                (Some(cypher), _) => cypher.clone(),
                (None, Some(n)) => match predefined(*n) {
                    Some(q) => q.to_string(),
                    None => bail!("no predefined query #{n} (1-{})", PREDEFINED_QUERIES.len()),
                },
                (None, None) => bail!("enter a Cypher query to run, or pass --example N"),
            };

            let client = RemoteClient::connect(&config.store)
                .await
                .with_context(|| format!("connecting to {}", config.store.url))?;
            let outcome = run_query(&client, &query, viz.as_deref(), &cli.format).await;
            client.close().await?;
            outcome?;
        }
        Commands::Examples => {
            for (i, query) in PREDEFINED_QUERIES.iter().enumerate() {
                println!("{:>2}. {}", i + 1, query);
            }
        }
        Commands::Refine { csv, custom } => {
            if let Some(text) = custom {
                if text.trim().is_empty() {
                    bail!("please enter a custom relationship");
                }
                println!("Custom Relationship");
                println!("{}", text);
                return Ok(());
            }

            let dataset = read_dataset(csv)?;
            let schema = infer_schema(dataset.columns());
            let refiner = SchemaRefiner::new(&config.refine)?;
            let suggestion = refiner
                .suggest(&schema)
                .await
                .context("refining schema")?;
            println!("Refined Schema");
            println!("{}", suggestion);
        }
        Commands::Shell => {
            let client = RemoteClient::connect(&config.store)
                .await
                .with_context(|| format!("connecting to {}", config.store.url))?;
            let outcome = run_shell(&client, &cli.format).await;
            client.close().await?;
            outcome?;
        }
    }

    Ok(())
}

async fn load_embedded(
    client: &EmbeddedClient,
    dataset: &Dataset,
    viz: Option<&Path>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let report = GraphLoader::new(client).load(dataset).await?;
    print_report(&report, format)?;

    {
        let store = client.store_read().await;
        println!("Nodes:   {}", store.node_count());
        println!("Edges:   {}", store.edge_count());
    }

    if let Some(path) = viz {
        let paths = client.paths().await?;
        write_visualization(&paths, path)?;
    }
    Ok(())
}

async fn run_query(
    client: &dyn GraphClient,
    cypher: &str,
    viz: Option<&Path>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let result = client.query(cypher).await?;

    if result.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    print_result(&result, format)?;

    if let Some(path) = viz {
        write_visualization(&result, path)?;
    }
    Ok(())
}

fn write_visualization(result: &QueryResult, path: &Path) -> anyhow::Result<()> {
    let graph = match VisGraph::from_query_result(result) {
        Ok(graph) => graph,
        Err(VizError::Empty) => {
            eprintln!("No data available to visualize.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if graph.is_empty() {
        eprintln!("No paths in result; return a path as `p` to visualize it.");
        return Ok(());
    }

    graph
        .write_html(path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Wrote {} node(s), {} edge(s) to {}",
        graph.nodes.len(),
        graph.edges.len(),
        path.display()
    );
    Ok(())
}

async fn run_shell(client: &RemoteClient, format: &OutputFormat) -> anyhow::Result<()> {
    println!("Knowledge Graph Shell");
    println!("Type Cypher queries, or :help for commands. :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("kg> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :examples   — List predefined queries");
                println!("  :example N  — Run predefined query N");
                println!("  :quit       — Exit shell");
                println!("  <cypher>    — Execute a Cypher query");
            }
            ":examples" => {
                for (i, query) in PREDEFINED_QUERIES.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, query);
                }
            }
            cmd if cmd.starts_with(":example ") => {
                let number = cmd[":example ".len()..].trim().parse::<usize>().ok();
                match number.and_then(predefined) {
                    Some(query) => {
                        println!("{}", query);
                        if let Err(e) = run_query(client, query, None, format).await {
                            eprintln!("Error: {:#}", e);
                        }
                    }
                    None => eprintln!("Error: no such example"),
                }
            }
            cypher => {
                if let Err(e) = run_query(client, cypher, None, format).await {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

fn print_dataset(dataset: &Dataset, format: &OutputFormat) -> anyhow::Result<()> {
    let cell = |v: &Option<String>| v.clone().unwrap_or_else(|| "NaN".to_string());

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Map<String, serde_json::Value>> = dataset
                .rows()
                .map(|row| {
                    dataset
                        .columns()
                        .iter()
                        .cloned()
                        .zip(row.values().iter().map(|v| serde_json::json!(v)))
                        .collect()
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            let header: Vec<String> = dataset
                .columns()
                .iter()
                .map(|c| format_csv_value(&serde_json::json!(c)))
                .collect();
            println!("{}", header.join(","));
            for row in dataset.rows() {
                let cells: Vec<String> = row
                    .values()
                    .iter()
                    .map(|v| format_csv_value(&serde_json::json!(v)))
                    .collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(dataset.columns());
            for row in dataset.rows() {
                table.add_row(row.values().iter().map(cell).collect::<Vec<_>>());
            }
            println!("{}", table);
        }
    }

    Ok(())
}

fn print_schema(schema: &InferredSchema, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        OutputFormat::Csv => {
            println!("kind,name,from,to");
            for entity in &schema.entities {
                println!("entity,{},,", format_csv_value(&serde_json::json!(entity)));
            }
            for rel in &schema.relationships {
                println!(
                    "relationship,{},{},{}",
                    format_csv_value(&serde_json::json!(rel.rel_type)),
                    format_csv_value(&serde_json::json!(rel.from)),
                    format_csv_value(&serde_json::json!(rel.to)),
                );
            }
            for column in schema.properties.keys() {
                println!("property,{},,", format_csv_value(&serde_json::json!(column)));
            }
        }
        OutputFormat::Table => {
            let mut entities = Table::new();
            entities.set_header(vec!["Entity"]);
            for entity in &schema.entities {
                entities.add_row(vec![entity.as_str()]);
            }
            println!("Entities\n{}", entities);

            let mut rels = Table::new();
            rels.set_content_arrangement(ContentArrangement::Dynamic);
            rels.set_header(vec!["Type", "From", "To"]);
            for rel in &schema.relationships {
                rels.add_row(vec![rel.rel_type.as_str(), rel.from.as_str(), rel.to.as_str()]);
            }
            println!("Relationships\n{}", rels);

            let mut props = Table::new();
            props.set_header(vec!["Column", "Kind"]);
            for (column, kind) in &schema.properties {
                props.add_row(vec![column.as_str(), kind.as_str()]);
            }
            println!("Properties\n{}", props);
        }
    }

    Ok(())
}

fn print_report(report: &LoadReport, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        _ => {
            println!("Rows read:             {}", report.rows_read);
            println!("Rows loaded:           {}", report.rows_loaded);
            println!("Rows skipped:          {}", report.rows_skipped);
            println!("Statements:            {}", report.statements);
            println!("Nodes created:         {}", report.nodes_created);
            println!("Relationships created: {}", report.relationships_created);
        }
    }
    Ok(())
}

fn print_result(result: &QueryResult, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.to_maps())?);
        }
        OutputFormat::Csv => {
            println!("{}", result.columns.join(","));
            for row in &result.records {
                let cells: Vec<String> = row.iter().map(format_csv_value).collect();
                println!("{}", cells.join(","));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(&result.columns);

            for row in &result.records {
                let cells: Vec<String> = row.iter().map(format_table_value).collect();
                table.add_row(cells);
            }

            println!("{}", table);
            println!("{} row(s)", result.records.len());
        }
    }

    Ok(())
}

fn format_table_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Object(map) => {
            // Nodes come back as property maps; show the key property
            if let Some(key) = map.get("name").or_else(|| map.get("code")) {
                return format!("({})", format_table_value(key));
            }
            serde_json::to_string(v).unwrap_or_default()
        }
        serde_json::Value::Array(_) => serde_json::to_string(v).unwrap_or_default(),
    }
}

fn format_csv_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "".to_string(),
        serde_json::Value::String(s) => {
            if s.contains(',') || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s.clone()
            }
        }
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => {
            let json = serde_json::to_string(v).unwrap_or_default();
            format!("\"{}\"", json.replace('"', "\"\""))
        }
    }
}
