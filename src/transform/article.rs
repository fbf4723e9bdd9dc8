//! PubMed efetch XML to [`DocumentRecord`]s.
//!
//! Handles the `<PubmedArticleSet>` shape with `<PubmedArticle>` and
//! `<PubmedBookArticle>` documents. Only the first `PMID` and `ArticleTitle`
//! of each document are read (later ones belong to comments/corrections).

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

use crate::entities::article::DocumentRecord;
use crate::error::PharmaError;

const EFETCH_API: &str = "pubmed-efetch";

#[derive(Debug, Default)]
struct DocumentDraft {
    pmid: Option<String>,
    title: Option<String>,
    abstract_text: Option<String>,
    in_pmid: bool,
    in_title: bool,
    in_abstract: bool,
    in_abstract_text: bool,
}

impl DocumentDraft {
    fn start(&mut self, name: &[u8]) {
        match name {
            b"PMID" if self.pmid.is_none() => {
                self.pmid = Some(String::new());
                self.in_pmid = true;
            }
            b"ArticleTitle" if self.title.is_none() => {
                self.title = Some(String::new());
                self.in_title = true;
            }
            b"Abstract" => {
                self.abstract_text.get_or_insert_with(String::new);
                self.in_abstract = true;
            }
            b"AbstractText" if self.in_abstract => self.in_abstract_text = true,
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            b"ArticleTitle" if self.title.is_none() => self.title = Some(String::new()),
            b"Abstract" => {
                self.abstract_text.get_or_insert_with(String::new);
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"PMID" => self.in_pmid = false,
            b"ArticleTitle" => self.in_title = false,
            b"Abstract" => self.in_abstract = false,
            b"AbstractText" => self.in_abstract_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let target = if self.in_pmid {
            self.pmid.as_mut()
        } else if self.in_title {
            self.title.as_mut()
        } else if self.in_abstract_text {
            self.abstract_text.as_mut()
        } else {
            None
        };
        if let Some(target) = target {
            target.push_str(text);
        }
    }

    fn finish(self) -> DocumentRecord {
        let pmid = self.pmid.map(|p| p.trim().to_string()).unwrap_or_default();

        let title = match self.title {
            Some(title) if !title.is_empty() => title,
            Some(_) => {
                warn!(pmid = pmid.as_str(), "article title is empty");
                String::new()
            }
            None => {
                warn!(pmid = pmid.as_str(), "document has no article title");
                String::new()
            }
        };

        let abstract_text = match self.abstract_text {
            Some(text) if !text.is_empty() => text,
            Some(_) => {
                warn!(pmid = pmid.as_str(), "abstract has no text");
                String::new()
            }
            None => {
                warn!(pmid = pmid.as_str(), "document has no abstract");
                String::new()
            }
        };

        DocumentRecord {
            pmid,
            title,
            abstract_text,
        }
    }
}

fn is_document(name: &[u8]) -> bool {
    matches!(name, b"PubmedArticle" | b"PubmedBookArticle")
}

fn xml_error(position: impl std::fmt::Display, err: impl std::fmt::Display) -> PharmaError {
    PharmaError::ApiXml {
        api: EFETCH_API.to_string(),
        message: format!("at byte {position}: {err}"),
    }
}

/// Parses an efetch response into one record per document, in document order.
///
/// `AbstractText` segments are concatenated with no separator. Missing titles
/// and abstracts become empty strings. Malformed or truncated markup, including
/// a body with no root element, is an error.
pub(crate) fn records_from_efetch_xml(xml: &str) -> Result<Vec<DocumentRecord>, PharmaError> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut current: Option<DocumentDraft> = None;
    let mut depth = 0_usize;
    let mut saw_root = false;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                saw_root = true;
                let name = e.local_name();
                if is_document(name.as_ref()) {
                    current = Some(DocumentDraft::default());
                } else if let Some(draft) = current.as_mut() {
                    draft.start(name.as_ref());
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                let name = e.local_name();
                if is_document(name.as_ref()) {
                    records.push(DocumentDraft::default().finish());
                } else if let Some(draft) = current.as_mut() {
                    draft.empty(name.as_ref());
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                let name = e.local_name();
                if is_document(name.as_ref()) {
                    if let Some(draft) = current.take() {
                        records.push(draft.finish());
                    }
                } else if let Some(draft) = current.as_mut() {
                    draft.end(name.as_ref());
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(draft) = current.as_mut() {
                    let text = e.unescape().map_err(|err| xml_error(position, err))?;
                    draft.text(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(draft) = current.as_mut() {
                    draft.text(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => {
                if current.is_some() {
                    return Err(xml_error(
                        reader.buffer_position(),
                        "document ended inside an article",
                    ));
                }
                if depth > 0 {
                    return Err(xml_error(
                        reader.buffer_position(),
                        format!("document ended with {depth} unclosed element(s)"),
                    ));
                }
                if !saw_root {
                    return Err(xml_error(reader.buffer_position(), "no root element"));
                }
                break;
            }
            Ok(_) => {}
            Err(err) => return Err(xml_error(reader.buffer_position(), err)),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_multi_segment_abstract() {
        let xml = r#"<?xml version="1.0" ?>
<!DOCTYPE PubmedArticleSet PUBLIC "-//NLM//DTD PubMedArticle, 1st January 2019//EN" "https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_190101.dtd">
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation Status="MEDLINE" Owner="NLM">
      <PMID Version="1">29500001</PMID>
      <Article PubModel="Print">
        <ArticleTitle>Rivaroxaban for <i>pulmonary</i> embolism.</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">Background text.</AbstractText>
          <AbstractText Label="RESULTS">Results &amp; more.</AbstractText>
        </Abstract>
      </Article>
      <CommentsCorrectionsList>
        <CommentsCorrections RefType="Cites"><PMID Version="1">11111111</PMID></CommentsCorrections>
      </CommentsCorrectionsList>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

        let records = records_from_efetch_xml(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pmid, "29500001");
        assert_eq!(records[0].title, "Rivaroxaban for pulmonary embolism.");
        assert_eq!(records[0].abstract_text, "Background text.Results & more.");
    }

    #[test]
    fn missing_abstract_keeps_record_with_empty_text() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle><MedlineCitation><PMID>1</PMID><Article>
    <ArticleTitle>First</ArticleTitle>
  </Article></MedlineCitation></PubmedArticle>
  <PubmedArticle><MedlineCitation><PMID>2</PMID><Article>
    <ArticleTitle>Second</ArticleTitle>
    <Abstract><AbstractText>Only this one.</AbstractText></Abstract>
  </Article></MedlineCitation></PubmedArticle>
</PubmedArticleSet>"#;

        let records = records_from_efetch_xml(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[0].abstract_text, "");
        assert_eq!(records[1].title, "Second");
        assert_eq!(records[1].abstract_text, "Only this one.");
    }

    #[test]
    fn empty_title_element_degrades_to_empty_string() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle><MedlineCitation><PMID>3</PMID><Article>
    <ArticleTitle/>
    <Abstract><AbstractText/><AbstractText>Text.</AbstractText></Abstract>
  </Article></MedlineCitation></PubmedArticle>
</PubmedArticleSet>"#;

        let records = records_from_efetch_xml(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "");
        assert_eq!(records[0].abstract_text, "Text.");
    }

    #[test]
    fn book_articles_count_as_documents() {
        let xml = r#"<PubmedArticleSet>
  <PubmedBookArticle><BookDocument><PMID>4</PMID>
    <ArticleTitle>Chapter title</ArticleTitle>
    <Abstract><AbstractText>Book abstract.</AbstractText></Abstract>
  </BookDocument></PubmedBookArticle>
</PubmedArticleSet>"#;

        let records = records_from_efetch_xml(xml).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pmid, "4");
        assert_eq!(records[0].abstract_text, "Book abstract.");
    }

    #[test]
    fn other_abstract_is_not_concatenated() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle><MedlineCitation><PMID>5</PMID><Article>
    <ArticleTitle>T</ArticleTitle>
    <Abstract><AbstractText>Main.</AbstractText></Abstract>
  </Article>
  <OtherAbstract Language="fre"><AbstractText>Autre.</AbstractText></OtherAbstract>
  </MedlineCitation></PubmedArticle>
</PubmedArticleSet>"#;

        let records = records_from_efetch_xml(xml).unwrap();
        assert_eq!(records[0].abstract_text, "Main.");
    }

    #[test]
    fn empty_article_set_yields_no_records() {
        assert!(records_from_efetch_xml("<PubmedArticleSet></PubmedArticleSet>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_markup_is_an_error() {
        let err = records_from_efetch_xml(
            "<PubmedArticleSet><PubmedArticle><ArticleTitle>x</Abstract></PubmedArticle>",
        )
        .unwrap_err();
        assert!(matches!(err, PharmaError::ApiXml { .. }));
    }

    #[test]
    fn unclosed_article_set_is_an_error() {
        let err = records_from_efetch_xml("<PubmedArticleSet>").unwrap_err();
        assert!(matches!(err, PharmaError::ApiXml { .. }));
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn truncated_after_complete_article_is_an_error() {
        let err = records_from_efetch_xml(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>7</PMID>\
             </MedlineCitation></PubmedArticle>",
        )
        .unwrap_err();
        assert!(matches!(err, PharmaError::ApiXml { .. }));
    }

    #[test]
    fn body_without_markup_is_an_error() {
        for body in ["", "   \n"] {
            let err = records_from_efetch_xml(body).unwrap_err();
            assert!(matches!(err, PharmaError::ApiXml { .. }), "{body:?}");
        }
    }

    #[test]
    fn self_closing_article_set_yields_no_records() {
        assert!(records_from_efetch_xml("<PubmedArticleSet/>").unwrap().is_empty());
    }

    #[test]
    fn truncated_document_is_an_error() {
        let err = records_from_efetch_xml(
            "<PubmedArticleSet><PubmedArticle><MedlineCitation><PMID>6</PMID>",
        )
        .unwrap_err();
        assert!(matches!(err, PharmaError::ApiXml { .. }));
    }
}
