// ==========================================
// 高校排课系统 - 基础资源数据仓储
// ==========================================
// 职责: 教室/课程/教师/班级的通用查存删
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entities::{Course, Room, StudentGroup, Teacher};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// EntityRepository - 基础资源仓储
// ==========================================

/// 基础资源仓储
/// 职责: 管理 room/course/teacher/student_group 四张表
#[derive(Debug)]
pub struct EntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EntityRepository {
    /// 创建新的基础资源仓储实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(&db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Room - 教室
    // ==========================================

    /// 新增教室,返回自增ID
    pub fn insert_room(&self, room_no: &str, capacity: Option<i64>) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO room (room_no, capacity) VALUES (?1, ?2)",
            params![room_no, capacity],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询教室
    pub fn find_room(&self, room_id: i64) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;
        let room = conn
            .query_row(
                "SELECT room_id, room_no, capacity FROM room WHERE room_id = ?1",
                params![room_id],
                |row| {
                    Ok(Room {
                        room_id: row.get(0)?,
                        room_no: row.get(1)?,
                        capacity: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(room)
    }

    /// 按编号查询教室
    pub fn find_room_by_no(&self, room_no: &str) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;
        let room = conn
            .query_row(
                "SELECT room_id, room_no, capacity FROM room WHERE room_no = ?1",
                params![room_no],
                |row| {
                    Ok(Room {
                        room_id: row.get(0)?,
                        room_no: row.get(1)?,
                        capacity: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(room)
    }

    /// 查询全部教室 (按编号排序)
    pub fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT room_id, room_no, capacity FROM room ORDER BY room_no")?;
        let rooms = stmt
            .query_map([], |row| {
                Ok(Room {
                    room_id: row.get(0)?,
                    room_no: row.get(1)?,
                    capacity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<Room>>>()?;
        Ok(rooms)
    }

    /// 删除教室
    pub fn delete_room(&self, room_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM room WHERE room_id = ?1", params![room_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Room", room_id));
        }
        Ok(())
    }

    // ==========================================
    // Course - 课程
    // ==========================================

    /// 新增课程,返回自增ID
    pub fn insert_course(&self, course_name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO course (course_name) VALUES (?1)",
            params![course_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询课程
    pub fn find_course(&self, course_id: i64) -> RepositoryResult<Option<Course>> {
        let conn = self.get_conn()?;
        let course = conn
            .query_row(
                "SELECT course_id, course_name FROM course WHERE course_id = ?1",
                params![course_id],
                |row| {
                    Ok(Course {
                        course_id: row.get(0)?,
                        course_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(course)
    }

    /// 查询全部课程 (按ID排序)
    pub fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT course_id, course_name FROM course ORDER BY course_id")?;
        let courses = stmt
            .query_map([], |row| {
                Ok(Course {
                    course_id: row.get(0)?,
                    course_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<Course>>>()?;
        Ok(courses)
    }

    /// 删除课程
    pub fn delete_course(&self, course_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM course WHERE course_id = ?1", params![course_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Course", course_id));
        }
        Ok(())
    }

    // ==========================================
    // Teacher - 教师
    // ==========================================

    /// 新增教师,返回自增ID
    pub fn insert_teacher(&self, teacher_name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO teacher (teacher_name) VALUES (?1)",
            params![teacher_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询教师
    pub fn find_teacher(&self, teacher_id: i64) -> RepositoryResult<Option<Teacher>> {
        let conn = self.get_conn()?;
        let teacher = conn
            .query_row(
                "SELECT teacher_id, teacher_name FROM teacher WHERE teacher_id = ?1",
                params![teacher_id],
                |row| {
                    Ok(Teacher {
                        teacher_id: row.get(0)?,
                        teacher_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(teacher)
    }

    /// 查询全部教师 (按ID排序)
    pub fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT teacher_id, teacher_name FROM teacher ORDER BY teacher_id")?;
        let teachers = stmt
            .query_map([], |row| {
                Ok(Teacher {
                    teacher_id: row.get(0)?,
                    teacher_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<Teacher>>>()?;
        Ok(teachers)
    }

    /// 删除教师
    pub fn delete_teacher(&self, teacher_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected =
            conn.execute("DELETE FROM teacher WHERE teacher_id = ?1", params![teacher_id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Teacher", teacher_id));
        }
        Ok(())
    }

    // ==========================================
    // StudentGroup - 班级
    // ==========================================

    /// 新增班级,返回自增ID
    pub fn insert_group(&self, group_name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO student_group (group_name) VALUES (?1)",
            params![group_name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询班级
    pub fn find_group(&self, group_id: i64) -> RepositoryResult<Option<StudentGroup>> {
        let conn = self.get_conn()?;
        let group = conn
            .query_row(
                "SELECT group_id, group_name FROM student_group WHERE group_id = ?1",
                params![group_id],
                |row| {
                    Ok(StudentGroup {
                        group_id: row.get(0)?,
                        group_name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(group)
    }

    /// 查询全部班级 (按ID排序)
    pub fn list_groups(&self) -> RepositoryResult<Vec<StudentGroup>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT group_id, group_name FROM student_group ORDER BY group_id")?;
        let groups = stmt
            .query_map([], |row| {
                Ok(StudentGroup {
                    group_id: row.get(0)?,
                    group_name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<StudentGroup>>>()?;
        Ok(groups)
    }

    /// 删除班级
    pub fn delete_group(&self, group_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM student_group WHERE group_id = ?1",
            params![group_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("StudentGroup", group_id));
        }
        Ok(())
    }
}
