use anyhow::{bail, Context, Result};

/// 命令行用法
pub const USAGE: &str = "用法:
  book_reader read <bookId> [起始章节] [阅读页数]
  book_reader search <关键字>
  book_reader home
  book_reader collection <分类ID>
  book_reader shelf
  book_reader unshelve <bookId>
  book_reader bookmarks
  book_reader unbookmark <书签ID>
  book_reader login <用户名> <密码>
  book_reader register <用户名> <密码>
  book_reader passwd <旧密码> <新密码> <确认新密码>
  book_reader logout";

/// 命令行命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Read {
        book_id: String,
        start_chapter: Option<u32>,
        pages: u32,
    },
    Search(String),
    Home,
    Collection(String),
    Shelf,
    RemoveFromShelf(String),
    Bookmarks,
    DeleteBookmark(String),
    Login { username: String, password: String },
    Register { username: String, password: String },
    ChangePassword {
        current: String,
        new: String,
        confirm: String,
    },
    Logout,
}

impl Command {
    /// 解析命令行参数（不含程序名）
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let Some((name, rest)) = args.split_first() else {
            bail!("缺少命令\n{}", USAGE);
        };

        let command = match (name.as_str(), rest) {
            ("read", [book_id, tail @ ..]) if tail.len() <= 2 => {
                let start_chapter = tail
                    .first()
                    .map(|s| s.parse::<u32>())
                    .transpose()
                    .with_context(|| format!("起始章节必须是数字\n{}", USAGE))?;
                let pages = tail
                    .get(1)
                    .map(|s| s.parse::<u32>())
                    .transpose()
                    .with_context(|| format!("阅读页数必须是数字\n{}", USAGE))?
                    .unwrap_or(1);
                Command::Read {
                    book_id: book_id.clone(),
                    start_chapter,
                    pages,
                }
            }
            ("search", words) if !words.is_empty() => Command::Search(words.join(" ")),
            ("home", []) => Command::Home,
            ("collection", [id]) => Command::Collection(id.clone()),
            ("shelf", []) => Command::Shelf,
            ("unshelve", [id]) => Command::RemoveFromShelf(id.clone()),
            ("bookmarks", []) => Command::Bookmarks,
            ("unbookmark", [id]) => Command::DeleteBookmark(id.clone()),
            ("login", [username, password]) => Command::Login {
                username: username.clone(),
                password: password.clone(),
            },
            ("register", [username, password]) => Command::Register {
                username: username.clone(),
                password: password.clone(),
            },
            ("passwd", [current, new, confirm]) => Command::ChangePassword {
                current: current.clone(),
                new: new.clone(),
                confirm: confirm.clone(),
            },
            ("logout", []) => Command::Logout,
            _ => bail!("无法识别的命令: {}\n{}", args.join(" "), USAGE),
        };

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        assert_eq!(
            Command::parse(["read", "b1", "5", "3"]).unwrap(),
            Command::Read {
                book_id: "b1".to_string(),
                start_chapter: Some(5),
                pages: 3
            }
        );
        assert_eq!(
            Command::parse(["read", "b1"]).unwrap(),
            Command::Read {
                book_id: "b1".to_string(),
                start_chapter: None,
                pages: 1
            }
        );
        assert!(Command::parse(["read", "b1", "five"]).is_err());
    }

    #[test]
    fn test_parse_search_joins_words() {
        assert_eq!(
            Command::parse(["search", "百年", "孤独"]).unwrap(),
            Command::Search("百年 孤独".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(Command::parse(Vec::<String>::new()).is_err());
        assert!(Command::parse(["login", "only-user"]).is_err());
        assert!(Command::parse(["fly"]).is_err());
    }
}
