use blogsmith::{check, config, generate, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blogsmith")]
#[command(about = "Static site generator for a personal blog")]
#[command(long_about = "\
Static site generator for a personal blog

A JSON manifest lists the posts, one markdown file per post holds the body,
and HTML templates with {{token}} placeholders give the pages their shape.

Project structure:

  project/
  ├── site.toml                # Site config: identity, author, navigation
  ├── markdown/
  │   ├── posts.json           # Manifest: slug, title, excerpt, date
  │   └── hello-world.md       # Body for slug \"hello-world\"
  ├── templates/
  │   ├── blog.html            # Post page
  │   ├── homepage.html        # Homepage with post cards
  │   └── speaking.html        # Secondary page (listed in build.pages)
  ├── index.html               # ← generated
  └── reads/                   # ← generated, recreated on every build
      └── hello-world/index.html

Run 'blogsmith gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file, relative to the project root
    #[arg(long, default_value = "site.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every post, the homepage and secondary pages
    Build,
    /// Validate config, templates and posts without writing anything
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            init_thread_pool();
            println!("==> Building {}", cli.root.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let root = cli.root.clone();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_generate_event(&event, &root);
                }
            });
            let result = generate::generate(&cli.root, &cli.config, Some(tx));
            printer.join().ok();
            let report = result?;
            output::print_generate_report(&report);
        }
        Command::Check => {
            println!("==> Checking {}", cli.root.display());
            let report = check::check(&cli.root, &cli.config)?;
            output::print_check_report(&report);
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Size the rayon pool to the available cores.
fn init_thread_pool() {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
