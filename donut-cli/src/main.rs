use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use artifact_cache::{ArtifactCache, CommandGenerator};
use data_error::DonutError;
use data_model::filter_spec::FilterSpec;
use data_model::projection::Projection;
use data_model::record::UserRecord;
use fs_store::UserStore;
use query::ProjectedUsers;

#[derive(Parser, Debug)]
#[clap(name = "donut-cli")]
#[clap(about = "Query and maintain the Donut user collection", long_about = None)]
struct Cli {
    /// Path to the users JSON file
    #[clap(long, global = true, default_value = "users.json")]
    data: PathBuf,

    /// Public asset root; generated faces live under average-faces/
    #[clap(long, global = true, default_value = "public")]
    public_dir: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

/// Filter parameters shared by the listing and artifact commands.
/// Values are matched case-insensitively; empty values impose no
/// constraint.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[clap(long)]
    species: Option<String>,

    /// Keep only users with a high score of at least this value
    #[clap(long = "min-highscore")]
    min_highscore: Option<String>,

    /// "true" keeps friends of the reference user, "false" the rest
    #[clap(long = "friend-status")]
    friend_status: Option<String>,

    #[clap(long)]
    option: Option<String>,

    #[clap(long)]
    house: Option<String>,

    #[clap(long)]
    gender: Option<String>,

    #[clap(long)]
    graduation: Option<String>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let pairs = [
            ("species", &self.species),
            ("min-highscore", &self.min_highscore),
            ("friend-status", &self.friend_status),
            ("option", &self.option),
            ("house", &self.house),
            ("gender", &self.gender),
            ("graduation", &self.graduation),
        ];
        FilterSpec::from_pairs(
            pairs
                .iter()
                .filter_map(|(name, value)| {
                    value.as_deref().map(|v| (*name, v))
                }),
        )
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List users matching the filter parameters
    Users {
        #[clap(flatten)]
        filters: FilterArgs,

        /// Reference user; excluded from the listing and required for
        /// friend-status filters
        #[clap(long)]
        user: Option<String>,

        /// "scores" orders by descending high score
        #[clap(long)]
        sort: Option<String>,

        /// Output projection: names, image-paths or json
        #[clap(long = "type", default_value = "json")]
        projection: String,
    },

    /// Return the averaged-face artifact for the filtered set
    AverageFace {
        #[clap(flatten)]
        filters: FilterArgs,

        #[clap(long, default_value = "python3")]
        interpreter: String,

        #[clap(long, default_value = "img-processing/get-average-face.py")]
        script: PathBuf,
    },

    /// Add a new user with an empty friends list and no score
    NewUser {
        #[clap(long)]
        username: Option<String>,

        #[clap(long)]
        password: Option<String>,

        #[clap(long = "image-path")]
        image_path: Option<String>,

        #[clap(long)]
        species: Option<String>,

        #[clap(long)]
        email: Option<String>,
    },

    /// Record a new score for the reference user; the stored high
    /// score never decreases
    UpdateScore {
        /// Reference user whose score is being updated
        #[clap(long)]
        user: String,

        score: i64,
    },

    /// Create a symmetric friendship between the reference user and
    /// the target; repeating it is a no-op
    AddFriend {
        /// Reference user initiating the friendship
        #[clap(long)]
        user: String,

        username: String,
    },
}

fn main() {
    env_logger::init();

    let args = Cli::parse();
    match run(&args) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("{}", err);
            let code = match err.downcast_ref::<DonutError>() {
                Some(donut) if donut.is_client_error() => 2,
                _ => 1,
            };
            std::process::exit(code);
        }
    }
}

fn run(args: &Cli) -> Result<String> {
    log::debug!("using data file {}", args.data.display());
    let store = UserStore::new("users".to_owned(), &args.data);

    match &args.command {
        Command::Users {
            filters,
            user,
            sort,
            projection,
        } => {
            let records = store.load_all()?;
            let mut users =
                query::filter(records, &filters.to_spec(), user.as_deref())?;
            if sort.as_deref() == Some("scores") {
                query::sort_by_high_score(&mut users, true);
            }
            match query::project(users, Projection::parse(Some(projection))) {
                ProjectedUsers::Text(names) => Ok(names),
                other => Ok(serde_json::to_string_pretty(&other)?),
            }
        }

        Command::AverageFace {
            filters,
            interpreter,
            script,
        } => {
            let records = store.load_all()?;
            let spec = filters.to_spec();
            let users = query::filter(records, &spec, None)?;

            let cache_dir = args.public_dir.join("average-faces");
            let cache = ArtifactCache::new("faces".to_owned(), &cache_dir)?;
            let generator =
                CommandGenerator::new(interpreter.clone(), script.clone());
            let handle = cache.get_or_create(
                &users,
                &spec.artifact_components(),
                &generator,
            )?;

            // imgPath is relative to the public asset root
            let img_path = handle
                .path
                .strip_prefix(&args.public_dir)
                .unwrap_or(&handle.path);
            Ok(serde_json::to_string_pretty(&json!({
                "description": handle.description,
                "imgPath": img_path,
            }))?)
        }

        Command::NewUser {
            username,
            password,
            image_path,
            species,
            email,
        } => {
            let record = UserRecord::new_signup(
                username.clone(),
                password.clone(),
                image_path.clone(),
                species.clone(),
                email.clone(),
            )?;
            let added = store.append_user(record)?;
            Ok(format!(
                "Request to add new user {} successfully received!",
                added.username
            ))
        }

        Command::UpdateScore { user, score } => {
            let updated = store.update_high_score(user, *score)?;
            Ok(format!(
                "Request to update score for {} successfully received! Score is now {}.",
                updated.username,
                updated.high_score.unwrap_or(*score)
            ))
        }

        Command::AddFriend { user, username } => {
            let (mine, theirs) = store.add_friend(user, username)?;
            Ok(serde_json::to_string_pretty(&json!({
                "curr_user": mine,
                "friend": theirs,
            }))?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn seed_users(temp_dir: &TempDir) -> PathBuf {
        let path = temp_dir.path().join("users.json");
        fs::write(
            &path,
            r#"[
    {
        "username": "amy",
        "species": "eel",
        "friends": [],
        "highScore": 10,
        "imagePath": "faces/amy.png"
    },
    {
        "username": "bo",
        "species": "not eel",
        "friends": [],
        "highScore": 20
    }
]"#,
        )
        .unwrap();
        path
    }

    fn cli(temp_dir: &TempDir, tail: &[&str]) -> Cli {
        let data = seed_users(temp_dir);
        let mut argv = vec![
            "donut-cli".to_owned(),
            "--data".to_owned(),
            data.display().to_string(),
        ];
        argv.extend(tail.iter().map(|s| (*s).to_owned()));
        Cli::parse_from(argv)
    }

    #[test]
    fn test_users_names_projection() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args =
            cli(&temp_dir, &["users", "--type", "names"]);
        assert_eq!(run(&args).unwrap(), "amy, bo");
    }

    #[test]
    fn test_users_sorted_by_scores() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args = cli(
            &temp_dir,
            &["users", "--sort", "scores", "--type", "names"],
        );
        assert_eq!(run(&args).unwrap(), "bo, amy");
    }

    #[test]
    fn test_users_image_paths_drop_nulls() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args = cli(&temp_dir, &["users", "--type", "image-paths"]);
        let output = run(&args).unwrap();
        let paths: Vec<String> = serde_json::from_str(&output).unwrap();
        assert_eq!(paths, vec!["faces/amy.png".to_owned()]);
    }

    #[test]
    fn test_friend_status_without_user_is_client_error() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args =
            cli(&temp_dir, &["users", "--friend-status", "true"]);
        let err = run(&args).unwrap_err();
        let donut = err.downcast_ref::<DonutError>().unwrap();
        assert!(donut.is_client_error());
    }

    #[test]
    fn test_new_user_requires_all_fields() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args = cli(
            &temp_dir,
            &["new-user", "--username", "cat", "--password", "pw"],
        );
        let err = run(&args).unwrap_err();
        assert!(err.to_string().starts_with("missing required field"));
    }

    #[test]
    fn test_update_score_echoes_new_high_score() {
        let temp_dir = TempDir::new("tmp").unwrap();
        let args = cli(&temp_dir, &["update-score", "--user", "amy", "7"]);
        let output = run(&args).unwrap();
        // 7 does not beat amy's stored 10
        assert!(output.ends_with("Score is now 10."));
    }
}
