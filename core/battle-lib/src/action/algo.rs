//! 本檔案僅收錄「有名且有固定公式」的演算法。
//! 例如：廣度優先搜尋、曼哈頓範圍等。
//! 若為專案自訂、尚未標準化或僅用於單一場景的邏輯，請勿放於此處。
use crate::*;
use std::collections::{HashSet, VecDeque};

/// 路徑搜尋專用棋盤介面，供 bfs 演算法使用
pub trait PathfindingBoard {
    /// 判斷座標是否合法
    fn is_valid(&self, pos: Pos) -> bool;
    /// 判斷座標是否可通行
    fn is_passable(&self, pos: Pos) -> bool;
    /// 取得鄰近座標
    fn get_neighbors(&self, pos: Pos) -> Vec<Pos>;
}

/// 上、下、左、右四方向鄰居，不處理邊界上限
pub fn orthogonal_neighbors(pos: Pos) -> Vec<Pos> {
    let mut neighbors = Vec::with_capacity(4);
    let dirs: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
    for (dx, dy) in dirs {
        let nx = pos.x as isize + dx;
        let ny = pos.y as isize + dy;
        if nx >= 0 && ny >= 0 {
            neighbors.push(Pos {
                x: nx as usize,
                y: ny as usize,
            });
        }
    }
    neighbors
}

/// 廣度優先搜尋，每步成本為 1
/// 回傳 (座標, 步數)，依發現順序排列，不含起點；步數不超過 budget
pub fn bfs(
    graph: &impl PathfindingBoard,
    start: Pos,
    budget: MovementCost,
) -> Vec<(Pos, MovementCost)> {
    let mut order = Vec::new();
    if budget == 0 {
        return order;
    }
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([(start, 0)]);

    while let Some((vertex, steps)) = queue.pop_front() {
        if steps >= budget {
            continue;
        }
        for next in graph.get_neighbors(vertex) {
            if visited.contains(&next) || !graph.is_valid(next) || !graph.is_passable(next) {
                continue;
            }
            visited.insert(next);
            order.push((next, steps + 1));
            queue.push_back((next, steps + 1));
        }
    }

    order
}

/// 以 center 為中心、曼哈頓距離 radius 內的所有合法座標（含中心）
pub fn manhattan_area(center: Pos, radius: usize, is_valid: impl Fn(Pos) -> bool) -> Vec<Pos> {
    let mut points = Vec::new();
    let min_y = center.y.saturating_sub(radius);
    let min_x = center.x.saturating_sub(radius);
    for y in min_y..=center.y + radius {
        for x in min_x..=center.x + radius {
            let pos = Pos { x, y };
            if center.manhattan(pos) <= radius && is_valid(pos) {
                points.push(pos);
            }
        }
    }
    points
}
