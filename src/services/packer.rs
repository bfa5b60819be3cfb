//! 贪心装箱选题 - 业务能力层
//!
//! ## 算法
//!
//! 1. 论述题池非空时，从池尾（最近考虑的一端）起找一道用时不超过最大档位的论述题
//! 2. 短题按估算用时升序稳定排序
//! 3. 依次尝试加入，累计用时不得超过 `最大档位 + 超时余量`，入选即从池中移除
//! 4. 每加入一道短题后检查是否落入某档位窗口 `[档位 - 容差, 档位 + 余量]`，命中即停止
//! 5. 题目用尽仍未命中时，返回已累计的部分结果（可能为空）
//!
//! 调用方负责在整个池总用时低于最小档位时不调用本打包器。

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::models::question::Question;
use crate::services::estimator::Estimator;
use crate::services::tiers::TierSet;

/// 打包参数
#[derive(Debug, Clone)]
pub struct PackParams {
    pub tiers: TierSet,
    /// 低于档位的容差（分钟）
    pub tolerance: u32,
    /// 超出档位的余量（分钟）
    pub overage: u32,
    /// 每份卷最多论述题数量，0 表示只出短题
    pub essay_cap: usize,
}

impl PackParams {
    /// 单份卷允许的最大用时
    pub fn ceiling(&self) -> u32 {
        self.tiers.max().saturating_add(self.overage)
    }
}

/// 题目工作队列
///
/// 每个组卷单元独占一份，打包时被原地消耗
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    items: Vec<Question>,
}

impl QuestionPool {
    pub fn new(items: Vec<Question>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.items.iter()
    }

    pub fn total_minutes(&self, estimator: &Estimator) -> u32 {
        estimator.total_minutes(&self.items)
    }

    /// 均匀打乱顺序
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.items.shuffle(rng);
    }

    /// 取走全部题目
    pub fn drain_all(&mut self) -> Vec<Question> {
        std::mem::take(&mut self.items)
    }

    fn take_at(&mut self, index: usize) -> Question {
        self.items.remove(index)
    }

    fn take_marked(&mut self, marked: &[bool]) {
        let mut idx = 0;
        self.items.retain(|_| {
            let keep = !marked[idx];
            idx += 1;
            keep
        });
    }
}

impl From<Vec<Question>> for QuestionPool {
    fn from(items: Vec<Question>) -> Self {
        Self::new(items)
    }
}

/// 一次打包的结果
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// 按入选顺序排列
    pub questions: Vec<Question>,
    pub total_minutes: u32,
    pub total_marks: u32,
    pub essay_count: usize,
    /// 命中的档位；未命中时为实际用时对应的最近档位
    pub tier: u32,
    /// 是否命中档位窗口
    pub hit: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn push(&mut self, question: Question, minutes: u32, is_essay: bool) {
        self.total_minutes = self.total_minutes.saturating_add(minutes);
        self.total_marks = self.total_marks.saturating_add(question.marks);
        if is_essay {
            self.essay_count += 1;
        }
        self.questions.push(question);
    }
}

/// 贪心打包器
pub struct Packer<'a> {
    estimator: &'a Estimator,
    params: &'a PackParams,
}

impl<'a> Packer<'a> {
    pub fn new(estimator: &'a Estimator, params: &'a PackParams) -> Self {
        Self { estimator, params }
    }

    /// 从两个池中选出一份卷，入选题目从池中移除
    pub fn pack(&self, standalone: &mut QuestionPool, essays: &mut QuestionPool) -> Selection {
        let mut selection = Selection::default();

        self.take_essays(essays, &mut selection);

        let ceiling = self.params.ceiling();
        let minutes: Vec<u32> = standalone
            .iter()
            .map(|q| self.estimator.estimate_minutes(q))
            .collect();
        let mut order: Vec<usize> = (0..minutes.len()).collect();
        order.sort_by_key(|&i| minutes[i]);

        let mut accepted = vec![false; minutes.len()];
        let mut accepted_order = Vec::new();
        let mut running = selection.total_minutes;

        for i in order {
            if running.saturating_add(minutes[i]) > ceiling {
                continue;
            }
            running += minutes[i];
            accepted[i] = true;
            accepted_order.push(i);

            if let Some(tier) =
                self.params
                    .tiers
                    .hit(running, self.params.tolerance, self.params.overage)
            {
                selection.tier = tier;
                selection.hit = true;
                break;
            }
        }

        for &i in &accepted_order {
            selection.push(standalone.items[i].clone(), minutes[i], false);
        }
        standalone.take_marked(&accepted);

        // 没有短题入选时，论述题本身可能已落在档位窗口内
        if !selection.hit {
            match self
                .params
                .tiers
                .hit(selection.total_minutes, self.params.tolerance, self.params.overage)
            {
                Some(tier) => {
                    selection.tier = tier;
                    selection.hit = true;
                }
                None => selection.tier = self.params.tiers.nearest(selection.total_minutes),
            }
        }

        debug!(
            "打包完成: {} 道题, {} 分钟, {} 分, 档位 {} (命中: {})",
            selection.questions.len(),
            selection.total_minutes,
            selection.total_marks,
            selection.tier,
            selection.hit
        );

        selection
    }

    /// 取走全部短题和不超过上限的论述题
    ///
    /// 用于总用时不足最小档位时直接组成一份短卷
    pub fn take_all(&self, standalone: &mut QuestionPool, essays: &mut QuestionPool) -> Selection {
        let mut selection = Selection::default();
        self.take_essays(essays, &mut selection);
        for question in standalone.drain_all() {
            let minutes = self.estimator.estimate_minutes(&question);
            selection.push(question, minutes, false);
        }
        selection.tier = self.params.tiers.nearest(selection.total_minutes);
        selection.hit = self
            .params
            .tiers
            .hit(selection.total_minutes, self.params.tolerance, self.params.overage)
            .is_some();
        selection
    }

    /// 从池尾开始取用时不超过最大档位的论述题
    fn take_essays(&self, essays: &mut QuestionPool, selection: &mut Selection) {
        if self.params.essay_cap == 0 {
            return;
        }
        let limit = self.params.tiers.max();
        let mut index = essays.len();
        while index > 0 && selection.essay_count < self.params.essay_cap {
            index -= 1;
            let minutes = self.estimator.estimate_minutes(&essays.items[index]);
            if minutes <= limit && selection.total_minutes.saturating_add(minutes) <= limit {
                let essay = essays.take_at(index);
                selection.push(essay, minutes, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::fixtures::question;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn params(tiers: Vec<u32>, tolerance: u32, overage: u32, essay_cap: usize) -> PackParams {
        PackParams {
            tiers: TierSet::new("test", tiers).unwrap(),
            tolerance,
            overage,
            essay_cap,
        }
    }

    #[test]
    fn test_oversized_essay_rejected_and_standalone_hit() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 0, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![question("1", 6), question("2", 8)]);
        let mut essays = QuestionPool::new(vec![question("3", 20)]);

        let selection = packer.pack(&mut standalone, &mut essays);

        assert_eq!(selection.essay_count, 0);
        assert_eq!(selection.total_minutes, 28);
        assert_eq!(selection.tier, 30);
        assert!(selection.hit);
        let numbers: Vec<&str> = selection
            .questions
            .iter()
            .map(|q| q.question_number.as_str())
            .collect();
        assert_eq!(numbers, vec!["1", "2"]);
        assert!(standalone.is_empty());
        assert_eq!(essays.len(), 1);
    }

    #[test]
    fn test_essay_taken_from_back_of_pool() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![question("1", 1), question("2", 2)]);
        let mut essays = QuestionPool::new(vec![
            question("e1", 10),
            question("e2", 12),
            question("e3", 20),
        ]);

        let selection = packer.pack(&mut standalone, &mut essays);

        // e3 需要 50 分钟，超过最大档位；从尾部向前取到 e2（30 分钟）
        assert_eq!(selection.essay_count, 1);
        assert_eq!(selection.questions[0].question_number, "e2");
        // 30 + 2 = 32 落入 30 档窗口 [28, 35]，第二道短题不再加入
        assert_eq!(selection.total_minutes, 32);
        assert_eq!(selection.tier, 30);
        assert_eq!(standalone.len(), 1);
        let remaining: Vec<&str> = essays.iter().map(|q| q.question_number.as_str()).collect();
        assert_eq!(remaining, vec!["e1", "e3"]);
    }

    #[test]
    fn test_short_only_ignores_essays() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 0);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![question("1", 5), question("2", 5)]);
        let mut essays = QuestionPool::new(vec![question("e", 10)]);

        let selection = packer.pack(&mut standalone, &mut essays);
        assert_eq!(selection.essay_count, 0);
        assert_eq!(essays.len(), 1);
    }

    #[test]
    fn test_no_hit_returns_partial() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 0, 1);
        let packer = Packer::new(&est, &params);

        // 4 + 6 + 12 = 22 分钟，低于任何档位窗口
        let mut standalone =
            QuestionPool::new(vec![question("1", 6), question("2", 2), question("3", 3)]);
        let mut essays = QuestionPool::default();

        let selection = packer.pack(&mut standalone, &mut essays);
        assert!(!selection.hit);
        assert_eq!(selection.total_minutes, 22);
        assert_eq!(selection.tier, 25);
        assert!(standalone.is_empty());
    }

    #[test]
    fn test_ties_keep_pool_order_and_skip_oversized() {
        let est = Estimator::default();
        let params = params(vec![10], 0, 0, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![
            question("big", 6),
            question("a", 2),
            question("b", 2),
            question("c", 2),
        ]);
        let mut essays = QuestionPool::default();

        let selection = packer.pack(&mut standalone, &mut essays);
        let numbers: Vec<&str> = selection
            .questions
            .iter()
            .map(|q| q.question_number.as_str())
            .collect();
        // 4 + 4 = 8，再加 4 超过 10；big 需要 12 分钟也放不下
        assert_eq!(numbers, vec!["a", "b"]);
        let remaining: Vec<&str> = standalone
            .iter()
            .map(|q| q.question_number.as_str())
            .collect();
        assert_eq!(remaining, vec!["big", "c"]);
    }

    #[test]
    fn test_take_all_respects_essay_cap() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![question("1", 2), question("2", 1)]);
        let mut essays = QuestionPool::new(vec![question("Essay 1", 1), question("Essay 2", 1)]);

        let selection = packer.take_all(&mut standalone, &mut essays);
        assert_eq!(selection.questions.len(), 3);
        assert_eq!(selection.essay_count, 1);
        assert_eq!(selection.total_minutes, 4 + 2 + 2);
        assert_eq!(selection.tier, 25);
        assert!(!selection.hit);
        assert_eq!(essays.len(), 1);
    }

    #[test]
    fn test_repeated_packs_never_exceed_ceiling_or_repeat() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 1);
        let packer = Packer::new(&est, &params);
        let mut rng = SmallRng::seed_from_u64(7);

        let mut items: Vec<Question> = (0..40)
            .map(|i| question(&format!("s{}", i), (i % 9) as u32 + 1))
            .collect();
        items.extend((0..6).map(|i| question(&format!("e{}", i), 10 + i as u32)));
        let (s, e) = crate::services::partition::partition(items, &est);
        let mut standalone = QuestionPool::new(s);
        let mut essays = QuestionPool::new(e);
        standalone.shuffle(&mut rng);
        essays.shuffle(&mut rng);

        let mut seen = std::collections::HashSet::new();
        loop {
            let selection = packer.pack(&mut standalone, &mut essays);
            if selection.is_empty() {
                break;
            }
            assert!(selection.essay_count <= 1);
            assert!(selection.total_minutes <= params.ceiling());
            assert_eq!(
                selection.total_minutes,
                est.total_minutes(&selection.questions)
            );
            for q in &selection.questions {
                assert!(seen.insert(q.identity_key()), "重复选题: {}", q.label());
            }
        }
    }

    #[test]
    fn test_essay_alone_on_tier_is_hit() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::default();
        let mut essays = QuestionPool::new(vec![question("e", 12)]);

        let selection = packer.pack(&mut standalone, &mut essays);
        assert_eq!(selection.essay_count, 1);
        assert_eq!(selection.total_minutes, 30);
        assert!(selection.hit);
        assert_eq!(selection.tier, 30);
    }

    #[test]
    fn test_huge_marks_never_selected() {
        let est = Estimator::default();
        let params = params(vec![25, 30, 35], 2, 5, 1);
        let packer = Packer::new(&est, &params);

        let mut standalone = QuestionPool::new(vec![
            question("huge", 3_000_000_000),
            question("1", 5),
            question("2", 8),
        ]);
        let mut essays = QuestionPool::new(vec![question("e", u32::MAX)]);

        let selection = packer.pack(&mut standalone, &mut essays);
        assert_eq!(selection.total_minutes, 26);
        assert!(selection.hit);
        assert_eq!(standalone.len(), 1);
        assert_eq!(essays.len(), 1);
    }
}
