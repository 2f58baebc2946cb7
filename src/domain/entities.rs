// ==========================================
// 高校排课系统 - 基础资源实体
// ==========================================
// 职责: 教室/课程/教师/班级的值对象定义
// 红线: 引擎只关心标识相等,不做容量/资历匹配
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Room - 教室
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: i64,          // 教室ID
    pub room_no: String,       // 教室编号 (如 "A-01")
    pub capacity: Option<i64>, // 容量 (引擎不使用,仅展示)
}

// ==========================================
// Course - 课程
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,      // 课程ID
    pub course_name: String, // 课程名称
}

// ==========================================
// Teacher - 教师
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub teacher_id: i64,      // 教师ID
    pub teacher_name: String, // 教师姓名
}

// ==========================================
// StudentGroup - 班级
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentGroup {
    pub group_id: i64,      // 班级ID
    pub group_name: String, // 班级名称
}
