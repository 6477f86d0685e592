use anyhow::{anyhow, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use techblog::build::{build_site, BuildOptions, POSTS_DIRECTORY};
use techblog::logging::init_logging;
use techblog::parser::Parser;
use techblog::post::PostMetadata;
use techblog::search::{search, SearchQuery, SortBy};
use techblog::stats::{calculate_blog_stats, format_number};
use techblog::tag::tag_counts;
use tracing::info;

fn main() -> Result<()> {
    let project = Arg::with_name("project")
        .long("project")
        .short("p")
        .takes_value(true)
        .default_value(".")
        .global(true)
        .help("The directory holding config.yaml, content/posts, and public");

    let matches = App::new("techblog")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(project)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Raises log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders the site")
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory [default: <project>/out]"),
                )
                .arg(
                    Arg::with_name("theme")
                        .long("theme")
                        .takes_value(true)
                        .help("A directory of template and stylesheet overrides"),
                ),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Searches posts by text and tags")
                .arg(Arg::with_name("text").index(1).default_value(""))
                .arg(
                    Arg::with_name("tag")
                        .long("tag")
                        .short("t")
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Only posts with this tag; repeat to require several"),
                )
                .arg(
                    Arg::with_name("sort")
                        .long("sort")
                        .takes_value(true)
                        .possible_values(&SortBy::NAMES)
                        .default_value("date"),
                ),
        )
        .subcommand(SubCommand::with_name("tags").about("Lists tags by post count"))
        .subcommand(SubCommand::with_name("stats").about("Prints blog statistics"))
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));
    let project = PathBuf::from(matches.value_of("project").unwrap_or("."));

    match matches.subcommand() {
        ("build", Some(m)) => build(&project, m),
        ("search", Some(m)) => search_posts(&project, m),
        ("tags", Some(_)) => {
            for count in tag_counts(&posts(&project)) {
                println!("{:>4}  {}", count.count, count.tag);
            }
            Ok(())
        }
        ("stats", Some(_)) => {
            let stats = calculate_blog_stats(&posts(&project));
            println!("Posts:     {}", stats.total_posts);
            println!("Tags:      {}", stats.total_tags);
            println!("Words:     {}", format_number(stats.total_words));
            println!("Avg. read: {} min", stats.avg_read_time);
            Ok(())
        }
        (other, _) => Err(anyhow!("Unknown command `{}`", other)),
    }
}

fn build(project: &Path, m: &ArgMatches) -> Result<()> {
    let mut options = BuildOptions::new(project);
    if let Some(output) = m.value_of("output") {
        options.output_dir = PathBuf::from(output);
    }
    options.theme_dir = m.value_of("theme").map(PathBuf::from);

    let report = build_site(&options)?;
    info!(
        posts = report.posts,
        tags = report.tags,
        pages = report.pages,
        "Built site"
    );
    println!("{}", options.output_dir.display());
    Ok(())
}

fn search_posts(project: &Path, m: &ArgMatches) -> Result<()> {
    let query = SearchQuery {
        text: m.value_of("text").unwrap_or_default().to_owned(),
        tags: m
            .values_of("tag")
            .map(|tags| tags.map(str::to_owned).collect())
            .unwrap_or_default(),
        sort: m
            .value_of("sort")
            .unwrap_or("date")
            .parse()
            .map_err(|err: String| anyhow!(err))?,
    };
    for post in search(&posts(project), &query) {
        println!(
            "{}  {:<40}  {} min  [{}]",
            post.publish_date,
            post.title,
            post.read_time,
            post.tags.join(", ")
        );
    }
    Ok(())
}

fn posts(project: &Path) -> Vec<PostMetadata> {
    Parser::new(&project.join(POSTS_DIRECTORY)).all_posts()
}
