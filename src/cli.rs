use crate::document::{Contact, Info, License, Server, Tag};
use crate::openapi_builder::OpenApiBuilder;
use crate::petstore;
use crate::projection::OpenApiValue;
use crate::route::RouteTable;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::version::Version;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// OpenAPI from routes - Generate OpenAPI documentation from a documented route table
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Specification to generate (the default one if not specified)
    #[arg(short = 's', long = "spec", value_name = "ID")]
    pub spec: Option<String>,

    /// List the specification identifiers and exit
    #[arg(long = "list-specs")]
    pub list_specs: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Log already-parsed arguments
pub fn log_args(args: &CliArgs) {
    debug!("Parsed arguments: {:?}", args);

    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    info!("Specification: {}", args.spec.as_deref().unwrap_or("<default>"));
}

/// Document-level configuration of the pet store
pub fn petstore_builder() -> OpenApiBuilder {
    OpenApiBuilder::new()
        .info(Info {
            title: "Swagger Petstore - OpenAPI 3.0".to_string(),
            description: Some("A sample pet store server".to_string()),
            terms_of_service: Some("https://swagger.io/terms/".to_string()),
            contact: Some(Contact {
                email: Some("apiteam@swagger.io".to_string()),
                ..Contact::default()
            }),
            license: Some(License {
                name: "Apache 2.0".to_string(),
                url: Some("https://www.apache.org/licenses/LICENSE-2.0.html".to_string()),
            }),
            version: Version::new(1, 0, 17),
        })
        .server(Server::new("https://petstore3.swagger.io/api/v3"))
        .tag(Tag {
            description: Some("Everything about your Pets".to_string()),
            ..Tag::new("pet")
        })
        .tag(Tag {
            description: Some("Access to Petstore orders".to_string()),
            ..Tag::new("store")
        })
        .tag(Tag {
            description: Some("Operations about user".to_string()),
            ..Tag::new("user")
        })
        .external_docs("https://swagger.io", Some("Find out more about Swagger"))
        .common_error(500, OpenApiValue::example::<petstore::ApiResponse>())
}

/// Renders the requested specification of `routes` in the requested format
pub fn render(builder: &OpenApiBuilder, routes: &RouteTable, args: &CliArgs) -> Result<String> {
    let specs = builder.specifications(routes);
    if let Some(spec) = &args.spec {
        if !specs.iter().flatten().any(|known| known == spec) {
            anyhow::bail!("Unknown specification: {}", spec);
        }
    }

    let document = builder.build_spec(routes, args.spec.as_deref());
    info!(
        "OpenAPI document built with {} paths",
        document.paths.len()
    );

    info!("Serializing to {:?} format...", args.output_format);
    match args.output_format {
        OutputFormat::Json => serialize_json(&document),
        OutputFormat::Yaml => serialize_yaml(&document),
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let routes = petstore::routes();
    let builder = petstore_builder();
    info!("Collected {} routes", routes.len());

    if args.list_specs {
        for spec in builder.specifications(&routes) {
            println!("{}", spec.as_deref().unwrap_or("default"));
        }
        return Ok(());
    }

    let content = render(&builder, &routes, &args)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    Ok(())
}
