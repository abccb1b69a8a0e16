//! protowire-demo: builds the sample messages, writes them to disk and reads them back.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use protowire::fs::{read_message, write_message};
use protowire::{
    Codec, Error, Inspector, JsonCodec, JsonOptions, LocalFs, Message, Registry, Value, samples,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "protowire-demo", about = "Encode, persist and decode sample messages")]
struct Cli {
    /// Directory for simple.bin and addressbook.bin
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Key JSON objects by lowerCamelCase names
    #[arg(long)]
    json_names: bool,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Demos to run (default: all, in order)
    #[arg(long, value_enum, value_delimiter = ',')]
    only: Vec<Demo>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    Simple,
    Enum,
    Complex,
    AddressBook,
}

struct Ctx {
    registry: Arc<Registry>,
    codec: Codec,
    json: JsonCodec,
    out_dir: PathBuf,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let registry = Arc::new(samples::registry()?);
    let ctx = Ctx {
        codec: Codec::new(Arc::clone(&registry)),
        json: JsonCodec::with_options(
            Arc::clone(&registry),
            JsonOptions {
                use_json_names: cli.json_names,
                pretty: cli.pretty,
                ..JsonOptions::default()
            },
        ),
        registry,
        out_dir: cli.out_dir,
    };

    let demos = if cli.only.is_empty() {
        vec![Demo::Simple, Demo::Enum, Demo::Complex, Demo::AddressBook]
    } else {
        cli.only
    };
    for demo in demos {
        match demo {
            Demo::Simple => simple(&ctx)?,
            Demo::Enum => enumeration(&ctx)?,
            Demo::Complex => complex(&ctx)?,
            Demo::AddressBook => address_book(&ctx)?,
        }
    }
    Ok(())
}

fn simple(ctx: &Ctx) -> Result<(), Error> {
    let mut sm = samples::simple_message(&ctx.registry)?;
    println!("{}", sm.display(&ctx.registry));

    sm.set_by_name("name", "I renamed you")?;
    println!("{}", sm.display(&ctx.registry));
    println!("{}", id_line(&sm));

    let sm2 = round_trip(ctx, "simple.bin", &sm)?;
    println!("sm2: {}", sm2.display(&ctx.registry));

    let text = ctx.json.to_text(&sm);
    println!("smAsString {text}");
    let sm3 = ctx.json.from_text_type(&text, samples::SIMPLE)?;
    println!("Successfully created message: {}", sm3.display(&ctx.registry));
    Ok(())
}

fn id_line(msg: &Message) -> String {
    let id = msg
        .get_by_name("id")
        .and_then(|id| id.as_i64())
        .unwrap_or_default();
    format!("The ID is: {id}")
}

fn enumeration(ctx: &Ctx) -> Result<(), Error> {
    let mut em = samples::enum_message(&ctx.registry)?;
    em.set(2, Value::Enum(samples::MONDAY))?;
    println!("{}", em.display(&ctx.registry));
    Ok(())
}

fn complex(ctx: &Ctx) -> Result<(), Error> {
    let cm = samples::complex_message(&ctx.registry)?;
    println!("Complex message: {}", cm.display(&ctx.registry));
    Ok(())
}

fn address_book(ctx: &Ctx) -> Result<(), Error> {
    println!("===== Address Book Demo Below =====");
    let book = samples::address_book(&ctx.registry)?;
    let book2 = round_trip(ctx, "addressbook.bin", &book)?;
    if let Some(dump) = Inspector::new().inspect(&ctx.codec.encode(&book2)) {
        println!("{dump}");
    }
    Ok(())
}

fn round_trip(ctx: &Ctx, file_name: &str, msg: &Message) -> Result<Message, Error> {
    let path = ctx.out_dir.join(file_name);
    write_message(&LocalFs, &path, &ctx.codec, msg)?;
    info!(path = %path.display(), "data has been written");

    let descriptor = ctx
        .registry
        .describe(msg.type_name())
        .ok_or_else(|| Error::UnknownType(msg.type_name().to_string()))?;
    read_message(&LocalFs, &path, &ctx.codec, descriptor)
}
