//! Text command routing.
//!
//! One line maps to one [`Command`]. Most commands become a [`Directive`]
//! for the controller; `status` and `quit` are handled by the runner.
//! A line starting with `{` is read as a JSON-encoded directive.

use std::str::{FromStr, SplitWhitespace};

use blockwright_types::{Dimensions, Directive, Goal, ItemKind, Position, StateKind, StructureKind};

use crate::error::CommandError;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Queue a directive for the controller.
    Directive(Directive),
    /// Print what the agent is doing.
    Status,
    /// End the run.
    Quit,
}

/// Words after the command name.
struct Args<'a> {
    command: &'static str,
    words: SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn next(&mut self) -> Option<&'a str> {
        self.words.next()
    }

    fn required(&mut self, argument: &'static str) -> Result<&'a str, CommandError> {
        self.next().ok_or(CommandError::MissingArgument {
            command: self.command,
            argument,
        })
    }

    fn parse<T: FromStr>(&self, argument: &'static str, word: &str) -> Result<T, CommandError> {
        word.parse().map_err(|_parse_err| CommandError::InvalidArgument {
            command: self.command,
            argument,
            value: word.to_owned(),
        })
    }

    /// An optional count, defaulting to 1. Zero is rejected.
    fn count(&mut self) -> Result<u32, CommandError> {
        let Some(word) = self.next() else {
            return Ok(1);
        };
        match self.parse::<u32>("count", word)? {
            0 => Err(CommandError::InvalidArgument {
                command: self.command,
                argument: "count",
                value: word.to_owned(),
            }),
            n => Ok(n),
        }
    }

    /// Either nothing or exactly three numbers.
    fn triple<T: FromStr>(&mut self, argument: &'static str) -> Result<Option<[T; 3]>, CommandError> {
        let Some(first) = self.next() else {
            return Ok(None);
        };
        let a = self.parse(argument, first)?;
        let second = self.required(argument)?;
        let b = self.parse(argument, second)?;
        let third = self.required(argument)?;
        let c = self.parse(argument, third)?;
        Ok(Some([a, b, c]))
    }

    fn finish(mut self) -> Result<(), CommandError> {
        match self.next() {
            Some(extra) => Err(CommandError::TrailingInput {
                command: self.command,
                extra: extra.to_owned(),
            }),
            None => Ok(()),
        }
    }
}

fn assign(goal: Goal) -> Command {
    Command::Directive(Directive::Assign { goal })
}

/// Parse one command line. `owner` is used when `follow` names nobody.
pub fn parse_command(line: &str, owner: Option<&str>) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str::<Directive>(line)
            .map(Command::Directive)
            .map_err(|err| CommandError::InvalidArgument {
                command: "json",
                argument: "directive",
                value: err.to_string(),
            });
    }
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };
    let head = head.to_ascii_lowercase();
    let name = command_name(&head).ok_or_else(|| CommandError::Unknown { word: head.clone() })?;
    let mut args = Args {
        command: name,
        words,
    };
    let command = match name {
        "idle" => Command::Directive(Directive::Switch {
            state: StateKind::Idle,
        }),
        "stop" => Command::Directive(Directive::Stop),
        "status" => Command::Status,
        "quit" => Command::Quit,
        "build" => {
            let word = args.required("structure")?;
            let kind: StructureKind = args.parse("structure", word)?;
            let dimensions = args
                .triple::<u32>("dimension")?
                .map(|[w, l, h]| Dimensions::new(w, l, h));
            assign(Goal::Build { kind, dimensions })
        }
        "craft" => {
            let item = ItemKind::from(args.required("item")?);
            assign(Goal::Craft {
                item,
                count: args.count()?,
            })
        }
        "gather" => {
            let item = ItemKind::from(args.required("item")?);
            assign(Goal::Gather {
                item,
                count: args.count()?,
            })
        }
        "mine" => {
            let block = ItemKind::from(args.required("block")?);
            assign(Goal::Mine {
                block,
                count: args.count()?,
            })
        }
        "farm" => assign(Goal::Farm),
        "fish" => assign(Goal::Fish {
            catches: args.count()?,
        }),
        "trade" => {
            let give = ItemKind::from(args.required("offer")?);
            let want = ItemKind::from(args.required("request")?);
            assign(Goal::Trade { give, want })
        }
        "explore" => assign(Goal::Explore {
            waypoints: args.count()?,
        }),
        "follow" => {
            let named = args.next().or(owner).ok_or(CommandError::MissingArgument {
                command: "follow",
                argument: "owner",
            })?;
            assign(Goal::Follow {
                owner: named.to_owned(),
            })
        }
        "unfollow" => Command::Directive(Directive::Unfollow),
        "guard" => {
            let anchor = args.triple::<i32>("coordinate")?.map(|[x, y, z]| Position::new(x, y, z));
            assign(Goal::Guard { anchor })
        }
        _ => {
            let word = args.required("state")?;
            let state: StateKind = args.parse("state", word)?;
            Command::Directive(Directive::Switch { state })
        }
    };
    args.finish()?;
    Ok(command)
}

/// Canonical name for a command word, including aliases.
fn command_name(word: &str) -> Option<&'static str> {
    let name = match word {
        "idle" => "idle",
        "stop" | "halt" => "stop",
        "status" | "?" => "status",
        "quit" | "exit" => "quit",
        "build" => "build",
        "craft" => "craft",
        "gather" | "collect" => "gather",
        "mine" | "dig" => "mine",
        "farm" => "farm",
        "fish" => "fish",
        "trade" => "trade",
        "explore" => "explore",
        "follow" | "come" => "follow",
        "unfollow" => "unfollow",
        "guard" | "defend" => "guard",
        "state" | "switch" => "state",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn goal_of(line: &str) -> Option<Goal> {
        match parse_command(line, None) {
            Ok(Command::Directive(Directive::Assign { goal })) => Some(goal),
            _ => None,
        }
    }

    #[test]
    fn build_with_and_without_dimensions() {
        let house = Goal::Build {
            kind: StructureKind::House,
            dimensions: None,
        };
        assert_eq!(goal_of("build house"), Some(house));
        let wall = Goal::Build {
            kind: StructureKind::Wall,
            dimensions: Some(Dimensions::new(5, 1, 3)),
        };
        assert_eq!(goal_of("build wall 5 1 3"), Some(wall));
        assert_eq!(
            parse_command("build wall 5 1", None),
            Err(CommandError::MissingArgument {
                command: "build",
                argument: "dimension",
            })
        );
    }

    #[test]
    fn counts_default_to_one() {
        let table = Goal::Craft {
            item: ItemKind::from("crafting_table"),
            count: 1,
        };
        assert_eq!(goal_of("craft crafting_table"), Some(table));
        let logs = Goal::Gather {
            item: ItemKind::from("log"),
            count: 6,
        };
        assert_eq!(goal_of("gather log 6"), Some(logs));
        assert!(matches!(
            parse_command("mine stone 0", None),
            Err(CommandError::InvalidArgument { argument: "count", .. })
        ));
    }

    #[test]
    fn follow_falls_back_to_the_owner() {
        assert_eq!(
            parse_command("follow", Some("alex")).unwrap(),
            assign(Goal::Follow {
                owner: String::from("alex"),
            })
        );
        assert_eq!(
            parse_command("follow", None),
            Err(CommandError::MissingArgument {
                command: "follow",
                argument: "owner",
            })
        );
    }

    #[test]
    fn guard_takes_an_optional_position() {
        assert_eq!(goal_of("guard"), Some(Goal::Guard { anchor: None }));
        let anchor = Some(Position::new(1, -2, 3));
        assert_eq!(goal_of("defend 1 -2 3"), Some(Goal::Guard { anchor }));
    }

    #[test]
    fn state_switch_and_control_words() {
        assert_eq!(
            parse_command("state Farm", None).unwrap(),
            Command::Directive(Directive::Switch {
                state: StateKind::Farm,
            })
        );
        assert_eq!(parse_command("STOP", None).unwrap(), Command::Directive(Directive::Stop));
        assert_eq!(parse_command("status", None).unwrap(), Command::Status);
        assert_eq!(parse_command(" exit ", None).unwrap(), Command::Quit);
        assert_eq!(
            parse_command("unfollow", None).unwrap(),
            Command::Directive(Directive::Unfollow)
        );
    }

    #[test]
    fn bad_lines_are_rejected() {
        assert_eq!(parse_command("   ", None), Err(CommandError::Empty));
        assert_eq!(
            parse_command("dance", None),
            Err(CommandError::Unknown {
                word: String::from("dance"),
            })
        );
        assert_eq!(
            parse_command("farm now", None),
            Err(CommandError::TrailingInput {
                command: "farm",
                extra: String::from("now"),
            })
        );
        assert!(parse_command("state flying", None).is_err());
        assert!(parse_command("build castle", None).is_err());
    }

    #[test]
    fn json_directives_are_accepted() {
        let line = r#"{"directive":"assign","goal":{"goal":"fish","catches":2}}"#;
        assert_eq!(goal_of(line), Some(Goal::Fish { catches: 2 }));
    }
}
