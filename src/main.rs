mod cli;

use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use log::error;

use cli::{Cli, Collection};
use witx_parser::components::{ComponentTraits, HasArenaContainer};
use witx_parser::{Declaration, Document, ParseOptions, Ref, Source};

fn print_declarations<D>(document: &Document, declarations: &IndexMap<String, Ref<D>>)
where
    D: Declaration,
    ComponentTraits: HasArenaContainer<D>,
{
    for declaration in declarations.values() {
        println!("{}", declaration.get(document).declaration(document));
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().init();
    let cli = Cli::parse();

    let options = ParseOptions {
        unresolved: cli.unresolved.into(),
    };
    let document = match witx_parser::parse(Source::guess(&cli.input), &options) {
        Ok(document) => document,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let collections = match cli.kind {
        Some(kind) => vec![kind],
        None => Collection::ALL.to_vec(),
    };
    for collection in collections {
        match collection {
            // methods are printed with their resource
            Collection::Functions => {
                for (_, function) in document.top_level_functions() {
                    println!("{}", function.get(&document).declaration(&document));
                }
            }
            Collection::Records => print_declarations(&document, document.records()),
            Collection::Variants => print_declarations(&document, document.variants()),
            Collection::Enums => print_declarations(&document, document.enums()),
            Collection::Flags => print_declarations(&document, document.flags()),
            Collection::Unions => print_declarations(&document, document.unions()),
            Collection::Resources => print_declarations(&document, document.resources()),
            Collection::Aliases => print_declarations(&document, document.type_aliases()),
        }
    }
    ExitCode::SUCCESS
}
