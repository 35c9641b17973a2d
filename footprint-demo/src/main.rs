use std::fmt;
use std::sync::Arc;
use clap::{Parser, ValueEnum};
use footprint::{footprint_all, Args, ClassBuilder, Value};
use footprint::config::ConfigBuilder;
use footprint::function::Function;
use footprint::log::LogContext;

#[derive(Debug, Clone, PartialEq, ValueEnum)]
enum Surface {
    Macro,
    Runtime,
    Both
}

#[derive(Parser, Debug)]
#[command(
    name = "footprint-demo",
    version = "0.1.0",
    about = "Shows nested call logging on a small example type"
)]
struct Cli {
    // Which wrapping mechanism to run the scenario through
    #[arg(value_enum, long, default_value_t = Surface::Both, help = "Run the scenario through the attribute macros, the runtime class table, or both")]
    surface: Surface,

    #[arg(long, default_value_t = 4, help = "Spaces added per nested call")]
    indent_step: usize,

    #[arg(long, default_value_t = log::LevelFilter::Debug, help = "Most verbose level printed")]
    level: log::LevelFilter,

    #[arg(long, default_value = "World!!!", help = "Value passed to Test::bar")]
    hello: String,
}

struct Test {
    foo: String,
}

#[footprint_all]
impl Test {
    fn new() -> Self {
        Test { foo: "Foo".to_string() }
    }

    fn bar(&self, hello: &str) {
        footprint::log::info(format!("{} says {}", self.foo, hello));
        self.aj();
    }

    fn aj(&self) {
        self.waj();
    }

    fn waj(&self) {
        footprint::log::debug("waj!");
    }
}

#[footprint_all]
impl fmt::Display for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Test")
    }
}

fn run_macro_scenario(hello: &str) {
    let test = Test::new();
    test.bar(hello);
}

fn run_runtime_scenario(hello: &str) -> Result<(), footprint::Error> {
    let module = module_path!();
    let to_string = Function::new(module, "to_string", |_| Ok(Value::str("Test"))).param("self");

    let class = ClassBuilder::new(module, "Test")
        .method(to_string)
        .method(Function::new(module, "bar", |frame| frame.call_method("aj", Args::new()))
            .param("self")
            .param_default("hello", "World"))
        .method(Function::new(module, "aj", |frame| frame.call_method("waj", Args::new()))
            .param("self"))
        .method(Function::new(module, "waj", |_| {
            footprint::log::debug("waj!");
            Ok(Value::None)
        }).param("self"))
        .footprint_all()
        .build();

    class.call("bar", &Args::new().kwarg("hello", hello))?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level)
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{:<5}] {}", record.level(), record.args())
        })
        .init();

    let ctx = match LogContext::configured(ConfigBuilder::default().indent_step(cli.indent_step)) {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    ctx.scope(|| {
        if matches!(cli.surface, Surface::Macro | Surface::Both) {
            run_macro_scenario(&cli.hello);
        }

        if cli.surface == Surface::Both {
            ctx.blank();
        }

        if matches!(cli.surface, Surface::Runtime | Surface::Both) {
            if let Err(e) = run_runtime_scenario(&cli.hello) {
                ctx.error(format!("runtime scenario failed: {}", e));
                std::process::exit(1);
            }
        }
    });
}
