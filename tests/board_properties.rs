//! Service behavior over in-memory stores: pagination, like ledgers,
//! soft-deletion and reply-tree expansion, exercised end to end through
//! `FeedService` and `CommentService`.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use community_board_service::domain::models::{
    Actor, Club, Comment, Member, Post, PostType, Role,
};
use community_board_service::domain::views::{CommentView, REPLY_TREE_DEPTH};
use community_board_service::error::{AppError, Result};
use community_board_service::media::MediaStore;
use community_board_service::repository::{
    ClubStore, CommentLikeLedger, CommentStore, MemberStore, PostLikeLedger, PostStore,
};
use community_board_service::services::feed::{FeedCursor, FeedService, FEED_PAGE_SIZE};
use community_board_service::services::CommentService;

#[derive(Default)]
struct BoardState {
    clubs: HashMap<Uuid, Club>,
    members: HashMap<Uuid, Member>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    post_likes: HashSet<(Uuid, Uuid)>,
    comment_likes: HashSet<(Uuid, Uuid)>,
}

/// Shared in-memory board implementing every store interface the
/// services consume. Keyset filtering and ordering mirror the SQL the
/// Postgres repositories run.
#[derive(Clone, Default)]
struct InMemoryBoard {
    state: Arc<Mutex<BoardState>>,
}

impl InMemoryBoard {
    fn add_club(&self, moderators: Vec<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().clubs.insert(
            id,
            Club {
                id,
                name: "chess".to_string(),
                moderators,
            },
        );
        id
    }

    fn add_member(&self, club_id: Uuid, username: &str) -> Member {
        let member = Member {
            id: Uuid::new_v4(),
            club_id,
            user_id: Uuid::new_v4(),
            username: username.to_string(),
        };
        self.state
            .lock()
            .unwrap()
            .members
            .insert(member.id, member.clone());
        member
    }

    fn add_post_at(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        post_type: PostType,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().posts.insert(
            id,
            Post {
                id,
                club_id,
                author_id,
                slug: format!("post-{id}"),
                post_type: post_type.as_str().to_string(),
                title: "title".to_string(),
                body: None,
                flair_id: None,
                media_refs: Vec::new(),
                is_deleted: false,
                created_at,
                updated_at: created_at,
            },
        );
        id
    }
}

#[async_trait::async_trait]
impl PostStore for InMemoryBoard {
    async fn create_post(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        slug: &str,
        post_type: PostType,
        title: &str,
        body: Option<&str>,
        media_refs: &[String],
        flair_id: Option<Uuid>,
    ) -> Result<Post> {
        let mut state = self.state.lock().unwrap();
        if state.posts.values().any(|p| p.slug == slug) {
            return Err(AppError::Conflict("slug already exists".to_string()));
        }
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            club_id,
            author_id,
            slug: slug.to_string(),
            post_type: post_type.as_str().to_string(),
            title: title.to_string(),
            body: body.map(str::to_string),
            flair_id,
            media_refs: media_refs.to_vec(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .values()
            .find(|p| p.slug == slug && !p.is_deleted)
            .cloned())
    }

    async fn find_by_slug_any(&self, slug: &str) -> Result<Option<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn find_by_id(&self, post_id: Uuid) -> Result<Option<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.get(&post_id).filter(|p| !p.is_deleted).cloned())
    }

    async fn find_by_id_any(&self, post_id: Uuid) -> Result<Option<Post>> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.get(&post_id).cloned())
    }

    async fn fetch_feed_page(
        &self,
        club_id: Uuid,
        post_type: PostType,
        before: DateTime<Utc>,
        before_id: Uuid,
        author_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let state = self.state.lock().unwrap();
        let mut page: Vec<Post> = state
            .posts
            .values()
            .filter(|p| {
                p.club_id == club_id
                    && p.post_type == post_type.as_str()
                    && !p.is_deleted
                    && (p.created_at, p.id) < (before, before_id)
                    && author_id.map_or(true, |a| p.author_id == a)
            })
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn soft_delete(&self, post_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.posts.get_mut(&post_id) {
            Some(post) if !post.is_deleted => {
                post.is_deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl CommentStore for InMemoryBoard {
    async fn create_comment(
        &self,
        club_id: Uuid,
        author_id: Uuid,
        post_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            club_id,
            author_id,
            post_id,
            parent_comment_id,
            is_top_level: parent_comment_id.is_none(),
            body: body.to_string(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .comments
            .insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .get(&comment_id)
            .filter(|c| !c.is_deleted)
            .cloned())
    }

    async fn get_comment_any(&self, comment_id: Uuid) -> Result<Option<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state.comments.get(&comment_id).cloned())
    }

    async fn top_level_page(
        &self,
        post_id: Uuid,
        before: DateTime<Utc>,
        before_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        let mut page: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| {
                c.post_id == post_id
                    && c.is_top_level
                    && (c.created_at, c.id) < (before, before_id)
            })
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn replies_of(&self, parent_ids: &[Uuid]) -> Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        let mut replies: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.parent_comment_id.is_some_and(|p| parent_ids.contains(&p)))
            .cloned()
            .collect();
        replies.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(replies)
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id && !c.is_deleted)
            .count() as i64)
    }

    async fn counts_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let state = self.state.lock().unwrap();
        let mut counts = HashMap::new();
        for comment in state.comments.values() {
            if post_ids.contains(&comment.post_id) && !comment.is_deleted {
                *counts.entry(comment.post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn soft_delete(&self, comment_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.comments.get_mut(&comment_id) {
            Some(comment) if !comment.is_deleted => {
                comment.is_deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl PostLikeLedger for InMemoryBoard {
    async fn add(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().unwrap().post_likes.insert((post_id, user_id)))
    }

    async fn remove(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().unwrap().post_likes.remove(&(post_id, user_id)))
    }

    async fn count(&self, post_id: Uuid) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.post_likes.iter().filter(|(p, _)| *p == post_id).count() as i64)
    }

    async fn contains(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().unwrap().post_likes.contains(&(post_id, user_id)))
    }

    async fn counts_for(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let state = self.state.lock().unwrap();
        let mut counts = HashMap::new();
        for (post_id, _) in &state.post_likes {
            if post_ids.contains(post_id) {
                *counts.entry(*post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn liked_among(&self, user_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(post_ids
            .iter()
            .copied()
            .filter(|p| state.post_likes.contains(&(*p, user_id)))
            .collect())
    }
}

#[async_trait::async_trait]
impl CommentLikeLedger for InMemoryBoard {
    async fn add(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .comment_likes
            .insert((comment_id, user_id)))
    }

    async fn remove(&self, comment_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .comment_likes
            .remove(&(comment_id, user_id)))
    }

    async fn count(&self, comment_id: Uuid) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comment_likes
            .iter()
            .filter(|(c, _)| *c == comment_id)
            .count() as i64)
    }

    async fn counts_for(&self, comment_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let state = self.state.lock().unwrap();
        let mut counts = HashMap::new();
        for (comment_id, _) in &state.comment_likes {
            if comment_ids.contains(comment_id) {
                *counts.entry(*comment_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn liked_among(&self, user_id: Uuid, comment_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let state = self.state.lock().unwrap();
        Ok(comment_ids
            .iter()
            .copied()
            .filter(|c| state.comment_likes.contains(&(*c, user_id)))
            .collect())
    }
}

#[async_trait::async_trait]
impl MemberStore for InMemoryBoard {
    async fn is_member(&self, club_id: Uuid, user_id: Uuid) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .values()
            .any(|m| m.club_id == club_id && m.user_id == user_id))
    }

    async fn get_member(&self, member_id: Uuid) -> Result<Option<Member>> {
        Ok(self.state.lock().unwrap().members.get(&member_id).cloned())
    }

    async fn get_members(&self, member_ids: &[Uuid]) -> Result<Vec<Member>> {
        let state = self.state.lock().unwrap();
        Ok(member_ids
            .iter()
            .filter_map(|id| state.members.get(id).cloned())
            .collect())
    }
}

#[async_trait::async_trait]
impl ClubStore for InMemoryBoard {
    async fn get_club(&self, club_id: Uuid) -> Result<Option<Club>> {
        Ok(self.state.lock().unwrap().clubs.get(&club_id).cloned())
    }
}

/// Media store that records nothing; creation tests here attach no media.
struct NullMediaStore;

#[async_trait::async_trait]
impl MediaStore for NullMediaStore {
    async fn put(&self, _bytes: &[u8], _mime_type: &str) -> Result<String> {
        Ok("noop.png".to_string())
    }

    async fn delete(&self, _reference: &str) -> Result<()> {
        Ok(())
    }
}

fn feed_service(board: &InMemoryBoard) -> FeedService {
    let board = Arc::new(board.clone());
    FeedService::new(
        board.clone(),
        board.clone(),
        board.clone(),
        board.clone(),
        board,
        Arc::new(NullMediaStore),
        "/images/posts".to_string(),
    )
}

fn comment_service(board: &InMemoryBoard) -> CommentService {
    let board = Arc::new(board.clone());
    CommentService::new(
        board.clone(),
        board.clone(),
        board.clone(),
        board.clone(),
        board,
    )
}

fn actor_for(member: &Member) -> Actor {
    Actor {
        user_id: member.user_id,
        member_id: Some(member.id),
        role: Role::Student,
        club_id: Some(member.club_id),
    }
}

fn tree_depth(view: &CommentView) -> usize {
    view.replies.iter().map(tree_depth).max().map_or(0, |d| d + 1)
}

#[tokio::test]
async fn feed_pages_cover_every_post_exactly_once() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let author = board.add_member(club, "ada");
    let actor = actor_for(&author);

    // Three timestamps shared by multiple posts each, so paging with a
    // timestamp-only cursor has to cut inside a tie group.
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut all = HashSet::new();
    for group in 0..3 {
        let ts = base + Duration::minutes(group);
        for _ in 0..4 {
            all.insert(board.add_post_at(club, author.id, PostType::Post, ts));
        }
    }

    let service = feed_service(&board);
    let mut seen: Vec<Uuid> = Vec::new();
    let mut cursor = FeedCursor::default();
    loop {
        let page = service
            .fetch_feed(&actor, club, PostType::Post, cursor, None)
            .await
            .unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() as i64 <= FEED_PAGE_SIZE);
        let last = page.last().unwrap();
        cursor = FeedCursor {
            before: Some(last.posted_on),
            before_id: Some(last.id),
        };
        seen.extend(page.iter().map(|p| p.id));
    }

    let seen_set: HashSet<Uuid> = seen.iter().copied().collect();
    assert_eq!(seen.len(), seen_set.len(), "no post may appear twice");
    assert_eq!(seen_set, all, "every post must be returned");
}

#[tokio::test]
async fn timestamp_only_cursor_drops_the_whole_tie_group() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let author = board.add_member(club, "ada");
    let actor = actor_for(&author);

    let older = Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap();
    let boundary = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let tied_a = board.add_post_at(club, author.id, PostType::Post, boundary);
    let tied_b = board.add_post_at(club, author.id, PostType::Post, boundary);
    let old = board.add_post_at(club, author.id, PostType::Post, older);

    let service = feed_service(&board);
    let cursor = FeedCursor {
        before: Some(boundary),
        before_id: None,
    };
    let page = service
        .fetch_feed(&actor, club, PostType::Post, cursor, None)
        .await
        .unwrap();

    // Without an id component the cut is strictly older than the
    // timestamp; rows sharing it must not be re-returned.
    let ids: Vec<Uuid> = page.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![old]);
    assert!(!ids.contains(&tied_a) && !ids.contains(&tied_b));
}

#[tokio::test]
async fn repeated_likes_do_not_inflate_the_count() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    let service = feed_service(&board);
    let first = service.like_post(&actor, post).await.unwrap();
    let second = service.like_post(&actor, post).await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 1);
}

#[tokio::test]
async fn unlike_reverses_a_like_and_rejects_a_missing_one() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    let service = feed_service(&board);

    let err = service.unlike_post(&actor, post).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    service.like_post(&actor, post).await.unwrap();
    let count = service.unlike_post(&actor, post).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn deleted_posts_leave_the_feed_but_keep_their_comment_tree() {
    let board = InMemoryBoard::default();
    let moderator = Uuid::new_v4();
    let club = board.add_club(vec![moderator]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    let feed = feed_service(&board);
    let comments = comment_service(&board);
    comments
        .add_comment(&actor, post, "still here", None)
        .await
        .unwrap();

    let slug = board
        .state
        .lock()
        .unwrap()
        .posts
        .get(&post)
        .unwrap()
        .slug
        .clone();
    feed.delete_post(&actor, &slug).await.unwrap();

    let page = feed
        .fetch_feed(&actor, club, PostType::Post, FeedCursor::default(), None)
        .await
        .unwrap();
    assert!(page.is_empty());

    let tree = comments
        .fetch_comment_tree(&actor, post, None, FeedCursor::default())
        .await
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].body, "still here");
}

#[tokio::test]
async fn replies_nest_under_their_parent() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    let service = comment_service(&board);
    let parent = service
        .add_comment(&actor, post, "first", None)
        .await
        .unwrap();
    let reply = service
        .add_comment(&actor, post, "second", Some(parent.id))
        .await
        .unwrap();
    assert!(!reply.is_top_level);

    let tree = service
        .fetch_comment_tree(&actor, post, None, FeedCursor::default())
        .await
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].id, parent.id);
    assert_eq!(tree[0].replies.len(), 1);
    assert_eq!(tree[0].replies[0].id, reply.id);
}

#[tokio::test]
async fn parent_expansion_reaches_the_same_floor_as_the_top_level_view() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    // root -> r1 -> r2 -> r3 -> r4, one node per level
    let service = comment_service(&board);
    let root = service
        .add_comment(&actor, post, "root", None)
        .await
        .unwrap();
    let mut parent = root.id;
    let mut chain = Vec::new();
    for i in 1..=4 {
        let node = service
            .add_comment(&actor, post, &format!("r{i}"), Some(parent))
            .await
            .unwrap();
        parent = node.id;
        chain.push(node.id);
    }

    let expanded = service
        .fetch_comment_tree(&actor, post, Some(root.id), FeedCursor::default())
        .await
        .unwrap();

    // Roots of the expansion are the direct replies, each expanded so the
    // deepest node sits REPLY_TREE_DEPTH levels below the queried parent.
    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0].id, chain[0]);
    assert_eq!(tree_depth(&expanded[0]), REPLY_TREE_DEPTH - 1);

    let mut cursor = &expanded[0];
    while let Some(next) = cursor.replies.first() {
        cursor = next;
    }
    assert_eq!(cursor.id, chain[REPLY_TREE_DEPTH - 1], "r4 stays beyond the bound");
}

#[tokio::test]
async fn deleted_comments_render_as_placeholders_and_leave_the_count() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let member = board.add_member(club, "ada");
    let actor = actor_for(&member);
    let post = board.add_post_at(club, member.id, PostType::Post, Utc::now());

    let service = comment_service(&board);
    let root = service
        .add_comment(&actor, post, "root", None)
        .await
        .unwrap();
    service
        .add_comment(&actor, post, "reply", Some(root.id))
        .await
        .unwrap();

    service.delete_comment(&actor, root.id).await.unwrap();

    let tree = service
        .fetch_comment_tree(&actor, post, None, FeedCursor::default())
        .await
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert!(tree[0].is_deleted);
    assert!(tree[0].body.is_empty());
    assert_eq!(tree[0].replies.len(), 1);

    let feed = feed_service(&board);
    let page = feed
        .fetch_feed(&actor, club, PostType::Post, FeedCursor::default(), None)
        .await
        .unwrap();
    assert_eq!(page[0].comment_count, 1, "only the live reply counts");
}

#[tokio::test]
async fn news_reads_skip_the_membership_gate() {
    let board = InMemoryBoard::default();
    let club = board.add_club(vec![]);
    let author = board.add_member(club, "ada");
    board.add_post_at(club, author.id, PostType::News, Utc::now());

    let outsider = Actor {
        user_id: Uuid::new_v4(),
        member_id: None,
        role: Role::Student,
        club_id: None,
    };

    let service = feed_service(&board);
    let news = service
        .fetch_feed(&outsider, club, PostType::News, FeedCursor::default(), None)
        .await
        .unwrap();
    assert_eq!(news.len(), 1);

    let err = service
        .fetch_feed(&outsider, club, PostType::Post, FeedCursor::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
}
