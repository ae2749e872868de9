use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Map;
use std::path::PathBuf;
use statbank::params::{DataQuery, Language, SubjectsQuery, TablesQuery, build_variable_selector};
use statbank::{Client, ClientConfig, hierarchy, storage};

#[derive(Parser, Debug)]
#[command(
    name = "statbank",
    version,
    about = "Browse and fetch tables from the Statistics Denmark StatBank API"
)]
struct Cli {
    /// Response language (da or en). Defaults to STATBANK_LANG or da.
    #[arg(long, global = true)]
    lang: Option<String>,
    /// API base URL. Defaults to STATBANK_BASE_URL or the public endpoint.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the subject hierarchy as a tree.
    Subjects(SubjectsArgs),
    /// List tables in the catalog.
    Tables(TablesArgs),
    /// Show a table's metadata or its variable values.
    Tableinfo(TableinfoArgs),
    /// Fetch data for a table (and optionally save it).
    Data(DataArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SubjectsArgs {
    /// Subject ids to start from (e.g. 02 2401). Top level if omitted.
    ids: Vec<String>,
    /// Also list the tables under each subject.
    #[arg(long, default_value_t = false)]
    include_tables: bool,
    /// Descend all the way down the hierarchy.
    #[arg(long, default_value_t = false)]
    recursive: bool,
    /// Print the raw JSON response instead of a tree.
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[derive(Args, Debug)]
struct TablesArgs {
    /// Subject ids separated by comma or semicolon.
    #[arg(long)]
    subjects: Option<String>,
    /// Only tables updated within this many days.
    #[arg(long)]
    past_days: Option<u32>,
    /// Include tables that are no longer updated.
    #[arg(long, default_value_t = false)]
    include_inactive: bool,
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[derive(Args, Debug)]
struct TableinfoArgs {
    /// Table id (e.g. FOLK1A).
    table: String,
    /// List the selectable values of every variable.
    #[arg(long, default_value_t = false)]
    variables: bool,
    #[arg(long, default_value_t = false)]
    raw: bool,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Table id (e.g. BEF5).
    table: String,
    /// Variable selection CODE=V1,V2 (Danish codes, e.g. KØN=M,K). Repeatable;
    /// the table is indexed by these variables in the given order.
    #[arg(long = "var", value_name = "CODE=VALUES")]
    vars: Vec<String>,
    /// Save results to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    #[arg(long, default_value_t = false)]
    raw: bool,
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_var(s: &str) -> Result<(String, Vec<String>)> {
    let (code, values) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --var '{}', expected CODE=V1,V2", s))?;
    let values = parse_list(values);
    if code.trim().is_empty() || values.is_empty() {
        anyhow::bail!("invalid --var '{}', expected CODE=V1,V2", s);
    }
    Ok((code.trim().to_string(), values))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // An explicit --lang wins over STATBANK_LANG, even a malformed one.
    let mut config = ClientConfig::from_lookup(|key| match key {
        "STATBANK_LANG" if cli.lang.is_some() => None,
        _ => std::env::var(key).ok(),
    })?;
    if let Some(lang) = &cli.lang {
        config.lang = lang.parse::<Language>()?;
    }
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    let client = Client::new(config)?;

    match cli.cmd {
        Command::Subjects(args) => cmd_subjects(&client, args),
        Command::Tables(args) => cmd_tables(&client, args),
        Command::Tableinfo(args) => cmd_tableinfo(&client, args),
        Command::Data(args) => cmd_data(&client, args),
    }
}

fn cmd_subjects(client: &Client, args: SubjectsArgs) -> Result<()> {
    let query = SubjectsQuery {
        subjects: (!args.ids.is_empty()).then_some(args.ids),
        include_tables: args.include_tables,
        recursive: args.recursive,
    };
    if args.raw {
        let v = client.subjects_raw(&query)?;
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }
    let roots = client.subjects(&query).context("fetch subjects")?;
    for line in hierarchy::flatten(&roots) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_tables(client: &Client, args: TablesArgs) -> Result<()> {
    let query = TablesQuery {
        subjects: args.subjects.as_deref().map(parse_list),
        past_days: args.past_days,
        include_inactive: args.include_inactive,
    };
    if args.raw {
        let v = client.tables_raw(&query)?;
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }
    let tables = client.tables(&query).context("fetch tables")?;
    for t in &tables {
        println!(
            "{}\t{}\t{}\t{}",
            t.id,
            t.text,
            t.latest_period.as_deref().unwrap_or("NA"),
            t.variables.join(", ")
        );
    }
    eprintln!("{} tables", tables.len());
    Ok(())
}

fn cmd_tableinfo(client: &Client, args: TableinfoArgs) -> Result<()> {
    if args.raw {
        let v = client.tableinfo_raw(&args.table)?;
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }
    if args.variables {
        for row in client.table_variables(&args.table)? {
            println!("{}\t{}\t{}", row.id, row.text, row.variable);
        }
        return Ok(());
    }
    let info = client
        .tableinfo(&args.table)
        .with_context(|| format!("fetch tableinfo for {}", args.table))?;
    println!("{} - {}", info.id, info.text);
    if let Some(d) = &info.description {
        println!("{}", d);
    }
    for var in &info.variables {
        println!("  {} ({}): {} values", var.id, var.text, var.values.len());
    }
    Ok(())
}

fn cmd_data(client: &Client, args: DataArgs) -> Result<()> {
    let mut query = DataQuery::new(args.table.clone());
    for spec in &args.vars {
        let (code, values) = parse_var(spec)?;
        query = query.variable(build_variable_selector(&code, values, Map::new()));
    }

    if args.raw {
        let v = client.data_raw(&query)?;
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    let table = client
        .data(&query)
        .with_context(|| format!("fetch data for {}", args.table))?;

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&table, path)?,
            "json" => storage::save_json(&table, path)?,
            other => anyhow::bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", table.len(), path.display());
    } else {
        print!("{}", table);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_splits_code_and_values() {
        let (code, values) = parse_var("KØN=M, K").unwrap();
        assert_eq!(code, "KØN");
        assert_eq!(values, vec!["M", "K"]);
        assert!(parse_var("Tid").is_err());
        assert!(parse_var("Tid=").is_err());
    }
}
