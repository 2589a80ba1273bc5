//! A depth-limited agent to play Connect 4

use rayon::prelude::*;
use tracing::{debug, info};

use std::time::{Duration, Instant};

use crate::{
    board::{BoardState, Player},
    evaluator,
    transposition_table::{Bound, CacheKey, Entry, SearchResult, TranspositionCache},
    DRAW_SCORE, LOSS_SCORE, WIN_SCORE,
};

/// Picks a move for the side to move with a fixed depth search
///
/// `maximizing` selects the side to move: player one maximizes the score,
/// player two minimizes it. The cache is read before and written after
/// every node, and can be reused between calls.
pub fn choose_move(
    board: &BoardState,
    depth: usize,
    maximizing: bool,
    cache: &mut TranspositionCache,
) -> SearchResult {
    Searcher::new(cache).search(board, depth, maximizing)
}

/// Like [`choose_move`], but searches each root column on its own thread
///
/// Every worker searches its column with a full window. Workers read `cache`
/// through a shared reference and write only to a shard of their own, which
/// starts empty, so peak memory grows with the new entries rather than with
/// the size of `cache`. The shards are merged back into `cache` afterwards.
/// The chosen column and score are the same as [`choose_move`]'s, but
/// cutoffs found in one root column are not visible to its siblings, so
/// more nodes are searched in total.
pub fn parallel_choose_move(
    board: &BoardState,
    depth: usize,
    maximizing: bool,
    cache: &mut TranspositionCache,
) -> SearchResult {
    let key = CacheKey::new(board.fingerprint(), depth, maximizing);
    if let Some(entry) = cache.lookup(&key) {
        if entry.bound == Bound::Exact {
            return entry.result;
        }
    }
    if depth == 0 || board.is_terminal() {
        return choose_move(board, depth, maximizing, cache);
    }

    let player = Player::from_maximizing(maximizing);
    let moves = board.legal_moves();
    let snapshot = &*cache;
    let outcomes: Vec<(usize, i32, TranspositionCache)> = moves
        .par_iter()
        .filter_map(|&column| {
            let mut next = board.clone();
            next.drop(column, player).ok()?;

            let mut shard = TranspositionCache::new();
            let score = Searcher::with_shared(&mut shard, snapshot)
                .search(&next, depth - 1, !maximizing)
                .score;
            Some((column, score, shard))
        })
        .collect();

    let mut best: Option<SearchResult> = None;
    for &(column, score, _) in outcomes.iter() {
        let better = match best {
            None => true,
            Some(best) if maximizing => score > best.score,
            Some(best) => score < best.score,
        };
        if better {
            best = Some(SearchResult::new(Some(column), score));
        }
    }
    let best = best.unwrap_or_else(|| SearchResult::new(moves.first().copied(), DRAW_SCORE));

    for (_, _, shard) in outcomes.iter() {
        cache.merge(shard);
    }
    debug!(
        workers = outcomes.len(),
        entries = cache.len(),
        "merged worker caches"
    );

    cache.store(key, Entry::exact(best));
    best
}

/// Minimax search with alpha-beta pruning over a borrowed [`TranspositionCache`]
///
/// # Scoring
/// Scores are always on player one's axis: a position won by player one is
/// [`WIN_SCORE`], one won by player two is [`LOSS_SCORE`], a full board with
/// no winner is [`DRAW_SCORE`]. Positions where the search runs out of
/// depth are scored by [`evaluator::score`] from the point of view of the
/// player who just moved.
///
/// # Ties
/// Moves are tried in ascending column order and a later move has to be
/// strictly better to replace the current best, so the lowest of equally
/// scored columns is chosen.
pub struct Searcher<'a> {
    cache: &'a mut TranspositionCache,
    // read-only fallback consulted after `cache`, never written to
    shared: Option<&'a TranspositionCache>,

    /// The number of nodes searched by this `Searcher` so far (for diagnostics only)
    pub node_count: usize,
    /// The number of nodes answered from the cache
    pub cache_hits: usize,
    /// The number of nodes whose remaining moves were pruned
    pub cutoffs: usize,
}

impl<'a> Searcher<'a> {
    pub fn new(cache: &'a mut TranspositionCache) -> Self {
        Self {
            cache,
            shared: None,
            node_count: 0,
            cache_hits: 0,
            cutoffs: 0,
        }
    }

    /// A searcher that also answers from `shared` but stores only into `cache`
    pub fn with_shared(cache: &'a mut TranspositionCache, shared: &'a TranspositionCache) -> Self {
        Self {
            shared: Some(shared),
            ..Self::new(cache)
        }
    }

    /// Searches the position to a fixed depth with an unbounded window
    pub fn search(&mut self, board: &BoardState, depth: usize, maximizing: bool) -> SearchResult {
        let result = self.minimax(board, depth, i32::MIN, i32::MAX, maximizing);
        debug!(
            depth,
            nodes = self.node_count,
            cache_hits = self.cache_hits,
            cutoffs = self.cutoffs,
            column = ?result.column,
            score = result.score,
            "search complete"
        );
        result
    }

    /// Searches at increasing depths until `max_depth` or `time_limit` is reached
    ///
    /// The clock is only checked between depths, so the last search can run
    /// past the limit. Deepening stops early once a win for either side is
    /// found. Returns the depth of the last completed search with its result.
    pub fn search_iterative(
        &mut self,
        board: &BoardState,
        maximizing: bool,
        max_depth: usize,
        time_limit: Duration,
    ) -> (usize, SearchResult) {
        let start = Instant::now();

        let mut depth = max_depth.min(1);
        let mut result = self.search(board, depth, maximizing);
        loop {
            info!(
                depth,
                column = ?result.column,
                score = result.score,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "completed search depth"
            );
            if depth >= max_depth || result.score.abs() >= WIN_SCORE || start.elapsed() >= time_limit {
                break;
            }
            depth += 1;
            result = self.search(board, depth, maximizing);
        }
        (depth, result)
    }

    /// Scores a position where the search stops
    fn leaf_score(board: &BoardState, maximizing: bool) -> i32 {
        match board.winner() {
            Some(Player::One) => WIN_SCORE,
            Some(Player::Two) => LOSS_SCORE,
            None if board.is_full() => DRAW_SCORE,
            // score for the player whose move led here
            None => evaluator::score(board, Player::from_maximizing(maximizing).opponent()),
        }
    }

    /// Performs game tree search
    ///
    /// Returns the best column and the score of the position. Results outside
    /// the (alpha, beta) window are bounds in the fail-soft sense: a score
    /// at or below alpha is an upper bound, one at or above beta a lower bound.
    fn minimax(
        &mut self,
        board: &BoardState,
        depth: usize,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
    ) -> SearchResult {
        self.node_count += 1;

        let key = CacheKey::new(board.fingerprint(), depth, maximizing);
        let cached = self
            .cache
            .lookup(&key)
            .into_iter()
            .chain(self.shared.and_then(|shared| shared.lookup(&key)))
            .find(|entry| entry.decides(alpha, beta));
        if let Some(entry) = cached {
            self.cache_hits += 1;
            return entry.result;
        }

        if depth == 0 || board.is_terminal() {
            let result = SearchResult::leaf(Self::leaf_score(board, maximizing));
            self.cache.store(key, Entry::exact(result));
            return result;
        }

        let window = (alpha, beta);
        let player = Player::from_maximizing(maximizing);
        let moves = board.legal_moves();

        let mut best = SearchResult::leaf(if maximizing { i32::MIN } else { i32::MAX });
        for &column in moves.iter() {
            let mut next = board.clone();
            if next.drop(column, player).is_err() {
                continue;
            }
            let score = self.minimax(&next, depth - 1, alpha, beta, !maximizing).score;

            if maximizing {
                if score > best.score {
                    best = SearchResult::new(Some(column), score);
                }
                alpha = alpha.max(best.score);
                // the minimizing parent already has something better than this
                if best.score > beta {
                    self.cutoffs += 1;
                    break;
                }
            } else {
                if score < best.score {
                    best = SearchResult::new(Some(column), score);
                }
                beta = beta.min(best.score);
                if best.score < alpha {
                    self.cutoffs += 1;
                    break;
                }
            }
        }

        if best.column.is_none() {
            // no successor could be played, fall back to the first legal move
            best = SearchResult::new(moves.first().copied(), DRAW_SCORE);
        }

        self.cache
            .store(key, Entry::classify(best, window.0, window.1));
        best
    }
}
