use crate::{Error, Result};

/// Convert a pipe-delimited markdown table into comma-separated text.
///
/// Lines before the first one containing `|` are skipped, as are lines
/// without `|` inside the table. The second table line is dropped when it
/// is a `---` separator row.
pub fn markdown_table_to_csv(markdown: &str) -> Result<String> {
    let lines: Vec<&str> = markdown
        .trim()
        .lines()
        .skip_while(|line| !line.contains('|'))
        .collect();

    if lines.is_empty() {
        return Err(Error::Parse("no markdown table found".into()));
    }

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for (i, line) in lines.iter().enumerate() {
        if !line.contains('|') {
            continue;
        }
        let cells: Vec<&str> = line
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();

        if cells.is_empty() || (i == 1 && cells.iter().all(|cell| cell.contains('-'))) {
            continue;
        }
        writer.write_record(&cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| Error::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_records;

    const TABLE: &str = "Here is the table:\n\
        \n\
        | Anime Title | Timestamp | Gigguk Excited? | Notes |\n\
        |---|---|---|---|\n\
        | Dandadan | 1:05 | Yes | Aliens, ghosts |\n\
        | Re:Zero S3 | 12:30 | Neutral | |\n";

    #[test]
    fn test_converts_table() {
        let csv_text = markdown_table_to_csv(TABLE).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next(),
            Some("Anime Title,Timestamp,Gigguk Excited?,Notes")
        );
        assert_eq!(lines.next(), Some("Dandadan,1:05,Yes,\"Aliens, ghosts\""));
        assert_eq!(lines.next(), Some("Re:Zero S3,12:30,Neutral"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_output_parses_back() {
        let csv_text = markdown_table_to_csv(TABLE).unwrap();
        let set = parse_records(&csv_text).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records[0].notes(), "Aliens, ghosts");
        assert_eq!(set.records[1].notes(), "");
    }

    #[test]
    fn test_no_table() {
        assert!(matches!(
            markdown_table_to_csv("sorry, no table today"),
            Err(Error::Parse(_))
        ));
    }
}
