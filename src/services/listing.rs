use crate::{
    error::AppResult,
    models::{comment, topic, Comment, Topic, TopicModel},
    services::topic::{author_or_unknown, load_authors, AuthorView},
};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const TOPICS_PER_PAGE: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TopicFilter {
    #[default]
    All,
    Solved,
    Unsolved,
    NoReplies,
}

impl TopicFilter {
    /// Unrecognised or missing values mean no filter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("solved") => Self::Solved,
            Some("unsolved") => Self::Unsolved,
            Some("no_replies") => Self::NoReplies,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Solved => "solved",
            Self::Unsolved => "unsolved",
            Self::NoReplies => "no_replies",
        }
    }
}

/// `trunc((total - 1) / per_page) + 1`. Integer division truncates toward
/// zero, so an empty result still has one (empty) page.
pub fn page_count(total: u64, per_page: u64) -> i64 {
    (total as i64 - 1) / per_page as i64 + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageResolution {
    Serve(u64),
    RedirectTo(i64),
}

pub fn resolve_page(requested: i64, nb_pages: i64) -> PageResolution {
    if requested < 1 {
        PageResolution::RedirectTo(1)
    } else if requested > nb_pages {
        PageResolution::RedirectTo(nb_pages)
    } else {
        PageResolution::Serve(requested as u64)
    }
}

/// Lower-cased `%term%` with LIKE wildcards escaped, or `None` for a blank
/// search.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.to_lowercase().chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Some(escaped)
}

#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub filter: TopicFilter,
    pub search: Option<String>,
    pub page: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicListItem {
    pub id: i32,
    pub title: String,
    pub author: AuthorView,
    pub created_at: chrono::NaiveDateTime,
    pub solved: bool,
    pub comment_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicPage {
    pub topics: Vec<TopicListItem>,
    pub filter: TopicFilter,
    pub search: String,
    pub current_page: i64,
    pub nb_pages: i64,
    pub total: u64,
}

#[derive(Debug)]
pub enum ListingOutcome {
    Page(TopicPage),
    /// The requested page is out of range; serve this one instead.
    Redirect { page: i64 },
}

pub struct ListingService {
    db: DatabaseConnection,
}

impl ListingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, query: &ListingQuery) -> AppResult<ListingOutcome> {
        let select = build_select(query.filter, query.search.as_deref());
        let paginator = select.paginate(&self.db, TOPICS_PER_PAGE);

        let total = paginator.num_items().await?;
        let nb_pages = page_count(total, TOPICS_PER_PAGE);

        let page = match resolve_page(query.page, nb_pages) {
            PageResolution::Serve(page) => page,
            PageResolution::RedirectTo(page) => return Ok(ListingOutcome::Redirect { page }),
        };

        let topics = paginator.fetch_page(page - 1).await?;
        let topics = self.decorate(topics).await?;

        Ok(ListingOutcome::Page(TopicPage {
            topics,
            filter: query.filter,
            search: query.search.clone().unwrap_or_default(),
            current_page: page as i64,
            nb_pages,
            total,
        }))
    }

    async fn decorate(&self, topics: Vec<TopicModel>) -> AppResult<Vec<TopicListItem>> {
        if topics.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = topics.iter().map(|t| t.id).collect();
        let counts: Vec<(i32, i64)> = Comment::find()
            .select_only()
            .column(comment::Column::TopicId)
            .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
            .filter(comment::Column::TopicId.is_in(ids))
            .group_by(comment::Column::TopicId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let counts: HashMap<i32, i64> = counts.into_iter().collect();

        let authors = load_authors(&self.db, topics.iter().map(|t| t.author_id)).await?;

        Ok(topics
            .into_iter()
            .map(|t| TopicListItem {
                id: t.id,
                author: author_or_unknown(&authors, t.author_id),
                comment_count: counts.get(&t.id).copied().unwrap_or(0),
                title: t.title,
                created_at: t.created_at,
                solved: t.solved,
            })
            .collect())
    }
}

/// Newest first, then one filter, then the optional search.
fn build_select(filter: TopicFilter, search: Option<&str>) -> Select<Topic> {
    let mut select = Topic::find();

    select = match filter {
        TopicFilter::All => select,
        TopicFilter::Solved => select.filter(topic::Column::Solved.eq(true)),
        TopicFilter::Unsolved => select.filter(topic::Column::Solved.eq(false)),
        TopicFilter::NoReplies => select
            .join(JoinType::LeftJoin, topic::Relation::Comments.def())
            .group_by(topic::Column::Id)
            .having(Expr::expr(Expr::col((comment::Entity, comment::Column::Id)).count()).eq(0)),
    };

    if let Some(pattern) = search_pattern(search) {
        // Both tables have a `message` column, so qualify it.
        let lower_like = |col: topic::Column| {
            Expr::expr(Func::lower(Expr::col((topic::Entity, col))))
                .like(LikeExpr::new(pattern.clone()).escape('\\'))
        };
        select = select.filter(
            Condition::any()
                .add(lower_like(topic::Column::Title))
                .add(lower_like(topic::Column::Message)),
        );
    }

    select
        .order_by_desc(topic::Column::CreatedAt)
        .order_by_desc(topic::Column::Id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_one_page() {
        assert_eq!(page_count(0, TOPICS_PER_PAGE), 1);
    }

    #[test]
    fn page_count_boundaries() {
        assert_eq!(page_count(1, 5), 1);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);
        assert_eq!(page_count(12, 5), 3);
        assert_eq!(page_count(15, 5), 3);
    }

    #[test]
    fn out_of_range_pages_redirect() {
        assert_eq!(resolve_page(5, 3), PageResolution::RedirectTo(3));
        assert_eq!(resolve_page(0, 3), PageResolution::RedirectTo(1));
        assert_eq!(resolve_page(-4, 3), PageResolution::RedirectTo(1));
        assert_eq!(resolve_page(2, 3), PageResolution::Serve(2));
        assert_eq!(resolve_page(1, 1), PageResolution::Serve(1));
    }

    #[test]
    fn filter_parsing() {
        assert_eq!(TopicFilter::parse(Some("solved")), TopicFilter::Solved);
        assert_eq!(TopicFilter::parse(Some("unsolved")), TopicFilter::Unsolved);
        assert_eq!(TopicFilter::parse(Some("no_replies")), TopicFilter::NoReplies);
        assert_eq!(TopicFilter::parse(Some("all")), TopicFilter::All);
        assert_eq!(TopicFilter::parse(Some("bogus")), TopicFilter::All);
        assert_eq!(TopicFilter::parse(None), TopicFilter::All);
    }

    #[test]
    fn filter_names_round_trip() {
        for f in [
            TopicFilter::All,
            TopicFilter::Solved,
            TopicFilter::Unsolved,
            TopicFilter::NoReplies,
        ] {
            assert_eq!(TopicFilter::parse(Some(f.as_str())), f);
        }
    }

    #[test]
    fn search_pattern_lowercases_and_escapes() {
        assert_eq!(search_pattern(Some("Rust")), Some("%rust%".to_string()));
        assert_eq!(search_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(None), None);
    }
}
